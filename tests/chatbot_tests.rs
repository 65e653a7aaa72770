mod common;

use std::sync::Arc;

use common::{
    GatedRecommender, ScriptedRecommender, form_reply, recommendation_reply, state_with, text_reply,
};
use tool_advisor_backend::error::AppError;
use tool_advisor_backend::models::{FormSubmission, MessageRole};
use tool_advisor_backend::services::catalog::CatalogScope;
use tool_advisor_backend::services::catalog_store::CatalogFile;
use tool_advisor_backend::services::catalog::Vendor;
use tool_advisor_backend::services::chatbot::{
    AUDIO_MESSAGE_PLACEHOLDER, FALLBACK_REPLY, run_turn, submit_form,
};
use tool_advisor_backend::services::recommender::RecommendationError;

#[tokio::test]
async fn turn_appends_one_user_and_one_assistant_message() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    recommender.push_reply(recommendation_reply());
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::ElCastor, None).await;

    let appended = run_turn(&state, &sid, "  escova para cozinha  ", None).await.unwrap();

    assert_eq!(appended.len(), 2);
    assert_eq!(appended[0].role, MessageRole::User);
    assert_eq!(appended[0].content, "escova para cozinha");
    assert_eq!(appended[1].role, MessageRole::Assistant);
    assert_eq!(appended[1].recommendations.as_ref().unwrap()[0].sku, "4002W");

    let history = state.sessions.get_history(&sid).await.unwrap();
    assert_eq!(history.len(), 3, "welcome + user + assistant");
    assert_eq!(recommender.queries()[0].text, "escova para cozinha");
}

#[tokio::test]
async fn failed_service_call_yields_fallback_and_keeps_history() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    recommender.push_reply(text_reply("primeira resposta"));
    recommender.push_error(RecommendationError::Status {
        status: 429,
        message: "RESOURCE_EXHAUSTED".into(),
    });
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::Unger, None).await;

    run_turn(&state, &sid, "rodo para vidro", None).await.unwrap();
    let before = state.sessions.get_history(&sid).await.unwrap();

    let appended = run_turn(&state, &sid, "e para piso?", None).await.unwrap();
    assert_eq!(appended[1].content, FALLBACK_REPLY);
    assert!(appended[1].recommendations.is_none());
    assert!(appended[1].clarification_form.is_none());

    let after = state.sessions.get_history(&sid).await.unwrap();
    assert_eq!(after.len(), before.len() + 2);
    for (old, new) in before.iter().zip(after.iter()) {
        assert_eq!(old.id, new.id);
        assert_eq!(old.content, new.content);
    }
    // no automatic retry
    assert_eq!(recommender.queries().len(), 2);
}

#[tokio::test]
async fn each_scope_sends_only_its_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    let state = state_with(&dir, recommender.clone());

    for scope in [CatalogScope::ElCastor, CatalogScope::Unger, CatalogScope::Both] {
        recommender.push_reply(text_reply("ok"));
        let sid = state.sessions.create_session(scope, None).await;
        run_turn(&state, &sid, "preciso de uma escova", None).await.unwrap();
    }

    let queries = recommender.queries();
    let castor = "CATÁLOGO TÉCNICO COMPLETO EL CASTOR";
    let unger = "CATÁLOGO TÉCNICO COMPLETO UNGER";
    assert!(queries[0].catalog_context.contains(castor));
    assert!(!queries[0].catalog_context.contains(unger));
    assert!(queries[1].catalog_context.contains(unger));
    assert!(!queries[1].catalog_context.contains(castor));
    assert!(queries[2].catalog_context.contains(castor));
    assert!(queries[2].catalog_context.contains(unger));
    assert_ne!(queries[0].catalog_context, queries[1].catalog_context);
}

#[tokio::test]
async fn stored_override_replaces_builtin_catalog_in_context() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    recommender.push_reply(text_reply("ok"));
    let state = state_with(&dir, recommender.clone());
    state
        .catalogs
        .put(&CatalogFile::new(Vendor::Unger, "unger-2025.txt", "UNGER 2025: SKU NOVO9"))
        .await
        .unwrap();

    let sid = state.sessions.create_session(CatalogScope::Unger, None).await;
    run_turn(&state, &sid, "rodo", None).await.unwrap();

    let ctx = &recommender.queries()[0].catalog_context;
    assert!(ctx.contains("UNGER 2025: SKU NOVO9"));
    assert!(!ctx.contains("CATÁLOGO TÉCNICO COMPLETO UNGER"));
}

#[tokio::test]
async fn audio_turn_uses_placeholder_and_forwards_audio() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    recommender.push_reply(text_reply("ouvi seu áudio"));
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::Both, None).await;

    let appended = run_turn(&state, &sid, "", Some("UklGRiQAAABXQVZF")).await.unwrap();

    assert_eq!(appended[0].content, AUDIO_MESSAGE_PLACEHOLDER);
    assert!(appended[0].has_audio);
    let query = &recommender.queries()[0];
    assert_eq!(query.text, "");
    assert_eq!(query.audio_base64.as_deref(), Some("UklGRiQAAABXQVZF"));
}

#[tokio::test]
async fn empty_or_malformed_input_appends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::Both, None).await;

    assert!(matches!(
        run_turn(&state, &sid, "   ", None).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        run_turn(&state, &sid, "", Some("not base64!!")).await,
        Err(AppError::BadRequest(_))
    ));
    assert_eq!(state.sessions.get_history(&sid).await.unwrap().len(), 1);
    assert!(recommender.queries().is_empty());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, ScriptedRecommender::new());
    assert!(matches!(
        run_turn(&state, "missing", "oi", None).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn form_submission_resubmits_through_chat_loop_once() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    recommender.push_reply(form_reply());
    recommender.push_reply(recommendation_reply());
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::ElCastor, None).await;

    let appended = run_turn(&state, &sid, "preciso limpar", None).await.unwrap();
    let form_msg_id = appended[1].id.clone();
    assert!(appended[1].clarification_form.is_some());

    let submission = FormSubmission {
        selected_options: vec!["Cozinha industrial".into(), "Banheiro".into()],
        additional_info: "gordura".into(),
    };
    let follow_up = submit_form(&state, &sid, &form_msg_id, &submission).await.unwrap();
    assert_eq!(
        follow_up[0].content,
        "RESPOSTA TÉCNICA:\nItens selecionados: Cozinha industrial; Banheiro.\nInfo Complementar: gordura"
    );
    assert_eq!(follow_up[1].recommendations.as_ref().unwrap().len(), 1);
    assert_eq!(recommender.queries()[1].text, follow_up[0].content);

    let history = state.sessions.get_history(&sid).await.unwrap();
    let form_msg = history.iter().find(|m| m.id == form_msg_id).unwrap();
    assert!(form_msg.form_submitted);

    let again = submit_form(&state, &sid, &form_msg_id, &submission).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(state.sessions.get_history(&sid).await.unwrap().len(), history.len());
}

#[tokio::test]
async fn invalid_form_answers_leave_form_open() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    recommender.push_reply(form_reply());
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::ElCastor, None).await;
    let appended = run_turn(&state, &sid, "preciso limpar", None).await.unwrap();
    let form_msg_id = appended[1].id.clone();

    let unknown = FormSubmission {
        selected_options: vec!["Hangar".into()],
        additional_info: String::new(),
    };
    assert!(matches!(
        submit_form(&state, &sid, &form_msg_id, &unknown).await,
        Err(AppError::BadRequest(_))
    ));
    let blank = FormSubmission::default();
    assert!(matches!(
        submit_form(&state, &sid, &form_msg_id, &blank).await,
        Err(AppError::BadRequest(_))
    ));

    // a message without a form
    let user_msg_id = appended[0].id.clone();
    let ok = FormSubmission {
        selected_options: vec!["Banheiro".into()],
        additional_info: String::new(),
    };
    assert!(matches!(
        submit_form(&state, &sid, &user_msg_id, &ok).await,
        Err(AppError::BadRequest(_))
    ));

    assert!(state.sessions.clarification_form(&sid, &form_msg_id).await.is_ok());
}

#[tokio::test]
async fn second_turn_is_rejected_while_first_is_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = Arc::new(GatedRecommender::default());
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::Both, None).await;

    let first = {
        let state = state.clone();
        let sid = sid.clone();
        tokio::spawn(async move { run_turn(&state, &sid, "primeira", None).await })
    };
    recommender.entered.notified().await;

    let second = run_turn(&state, &sid, "segunda", None).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    recommender.release.notify_one();
    let appended = first.await.unwrap().unwrap();
    assert_eq!(appended[1].content, "pronto");

    // lock released once the first turn finished
    let history = state.sessions.get_history(&sid).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(state.sessions.begin_turn(&sid).await.is_ok());
}

#[tokio::test]
async fn metrics_track_scope_and_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = ScriptedRecommender::new();
    recommender.push_reply(recommendation_reply());
    let state = state_with(&dir, recommender.clone());
    let sid = state.sessions.create_session(CatalogScope::Unger, None).await;

    run_turn(&state, &sid, "rodo", None).await.unwrap();
    run_turn(&state, &sid, "outro rodo", None).await.unwrap();

    let metrics = state.metrics.get_metrics().await;
    assert_eq!(metrics.catalog_usage.get("unger"), Some(&2));
    assert_eq!(metrics.outcome_usage.get("recommended"), Some(&1));
    assert_eq!(metrics.outcome_usage.get("fallback"), Some(&1));
}

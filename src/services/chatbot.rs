// src/services/chatbot.rs
//! The chat loop: one user turn in, one assistant message out.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use tracing::{info, warn};

use super::{metrics_manager::TurnOutcome, session_manager::Turn};
use crate::{
    error::AppError,
    models::{FormSubmission, Message, RecommendationQuery, RecommendationReply},
    state::AppState,
};

pub const FALLBACK_REPLY: &str =
    "Desculpe, ocorreu um erro ao processar sua solicitação. Tente novamente.";
pub const AUDIO_MESSAGE_PLACEHOLDER: &str = "Mensagem de áudio enviada";

fn outcome_of(reply: &RecommendationReply) -> TurnOutcome {
    if reply.clarification_form.is_some() {
        TurnOutcome::Clarification
    } else if !reply.recommendations.is_empty() {
        TurnOutcome::Recommended
    } else {
        TurnOutcome::Answered
    }
}

/// Runs one user turn and returns the two messages it appended.
pub async fn run_turn(
    state: &AppState,
    session_id: &str,
    text: &str,
    audio_base64: Option<&str>,
) -> Result<Vec<Message>, AppError> {
    let text = text.trim();
    let audio = audio_base64.map(str::trim).filter(|a| !a.is_empty());

    if text.is_empty() && audio.is_none() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }
    if let Some(audio) = audio {
        BASE64_STANDARD
            .decode(audio)
            .map_err(|e| AppError::BadRequest(format!("audio is not valid base64: {e}")))?;
    }

    let turn = state.sessions.begin_turn(session_id).await?;
    execute_turn(state, session_id, &turn, text, audio).await
}

/// Answers a clarification form and feeds the answer back as a new turn.
pub async fn submit_form(
    state: &AppState,
    session_id: &str,
    message_id: &str,
    submission: &FormSubmission,
) -> Result<Vec<Message>, AppError> {
    let turn = state.sessions.begin_turn(session_id).await?;

    let form = state.sessions.clarification_form(session_id, message_id).await?;
    if let Some(unknown) = submission
        .selected_options
        .iter()
        .find(|o| !form.options.contains(o))
    {
        return Err(AppError::BadRequest(format!("{unknown:?} is not an option of this form")));
    }
    if submission.selected_options.is_empty() && submission.additional_info.trim().is_empty() {
        return Err(AppError::BadRequest(
            "select at least one option or fill in the additional information".to_string(),
        ));
    }

    state.sessions.mark_form_submitted(session_id, message_id).await?;
    state.metrics.increment_form_submissions().await;
    info!(session_id, message_id, "clarification form submitted");

    let text = compose_form_answer(submission);
    execute_turn(state, session_id, &turn, &text, None).await
}

/// The follow-up message synthesized from a form answer.
pub fn compose_form_answer(submission: &FormSubmission) -> String {
    let mut text = String::from("RESPOSTA TÉCNICA:\n");
    if !submission.selected_options.is_empty() {
        text.push_str("Itens selecionados: ");
        text.push_str(&submission.selected_options.join("; "));
        text.push_str(".\n");
    }
    let info = submission.additional_info.trim();
    if !info.is_empty() {
        text.push_str("Info Complementar: ");
        text.push_str(info);
    }
    text
}

async fn execute_turn(
    state: &AppState,
    session_id: &str,
    turn: &Turn,
    text: &str,
    audio: Option<&str>,
) -> Result<Vec<Message>, AppError> {
    let user_message = match audio {
        Some(_) => Message::user_audio(AUDIO_MESSAGE_PLACEHOLDER),
        None => Message::user(text),
    };
    state.sessions.append_message(session_id, user_message.clone()).await?;
    state.metrics.increment_catalog(turn.catalog).await;

    let query = RecommendationQuery {
        text: text.to_string(),
        catalog_context: state.catalogs.context_for(turn.catalog).await,
        audio_base64: audio.map(str::to_string),
    };

    let (reply_message, outcome) = match state.recommender.recommend(&query).await {
        Ok(reply) => {
            let outcome = outcome_of(&reply);
            (Message::assistant_reply(reply), outcome)
        }
        Err(err) => {
            warn!(session_id, error = %err, "recommendation failed, sending fallback reply");
            (Message::assistant(FALLBACK_REPLY), TurnOutcome::Fallback)
        }
    };
    state.metrics.increment_outcome(outcome).await;
    info!(session_id, catalog = turn.catalog.as_str(), outcome = outcome.as_str(), "turn completed");

    state.sessions.append_message(session_id, reply_message.clone()).await?;
    Ok(vec![user_message, reply_message])
}

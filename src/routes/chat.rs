// src/routes/chat.rs
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, CreateSessionRequest, SessionView},
    models::FormSubmission,
    services::chatbot::{run_turn, submit_form},
    state::SharedState,
};

pub async fn create_session_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Json<SessionView> {
    let session_id = state
        .sessions
        .create_session(payload.catalog, payload.user_name.as_deref())
        .await;
    info!(%session_id, catalog = payload.catalog.as_str(), "session created");

    let messages = state.sessions.get_history(&session_id).await.unwrap_or_default();
    Json(SessionView {
        session_id,
        catalog: payload.catalog,
        messages,
    })
}

pub async fn get_session_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .get_session(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))?;

    Ok(Json(SessionView {
        session_id: session.id,
        catalog: session.catalog,
        messages: session.messages,
    }))
}

pub async fn delete_session_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove_session(&session_id).await {
        info!(%session_id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("session {session_id} not found")))
    }
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let messages = run_turn(
        &state,
        &payload.session_id,
        &payload.message,
        payload.audio_base64.as_deref(),
    )
    .await?;

    Ok(Json(ChatResponse {
        session_id: payload.session_id,
        messages,
    }))
}

pub async fn submit_form_handler(
    State(state): State<SharedState>,
    Path((session_id, message_id)): Path<(String, String)>,
    Json(submission): Json<FormSubmission>,
) -> Result<Json<ChatResponse>, AppError> {
    let messages = submit_form(&state, &session_id, &message_id, &submission).await?;
    Ok(Json(ChatResponse {
        session_id,
        messages,
    }))
}

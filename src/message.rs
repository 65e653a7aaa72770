// src/message.rs
use serde::{Deserialize, Serialize};

use crate::{
    models::Message,
    services::{catalog::CatalogScope, metrics_manager::MetricsData},
};

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub catalog: CatalogScope,
    pub user_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub catalog: CatalogScope,
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    #[serde(default)]
    pub message: String,
    pub audio_base64: Option<String>,
}

/// The messages appended by one turn: the user's and the assistant's.
#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
pub struct CatalogUpload {
    pub name: String,
    pub content: String,
}

#[derive(Serialize, Deserialize)]
pub struct MetricsReport {
    pub active_sessions: usize,
    #[serde(flatten)]
    pub metrics: MetricsData,
}

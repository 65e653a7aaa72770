// src/services/gemini.rs
//! Recommendation service backed by the Gemini REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::recommender::{RecommendationError, Recommender, parse_reply};
use crate::{
    config::GeminiConfig,
    models::{RecommendationQuery, RecommendationReply},
};

/// Recorded audio is sent as WAV.
pub const AUDIO_MIME_TYPE: &str = "audio/wav";

#[derive(Clone)]
pub struct GeminiRecommender {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiRecommender {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(query: &RecommendationQuery) -> Result<GenerateContentRequest, RecommendationError> {
        let mut parts = Vec::new();
        if !query.text.trim().is_empty() {
            parts.push(Part::Text {
                text: query.text.clone(),
            });
        }
        if let Some(audio) = query.audio_base64.as_deref().filter(|a| !a.is_empty()) {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: AUDIO_MIME_TYPE.to_string(),
                    data: audio.to_string(),
                },
            });
        }
        if parts.is_empty() {
            return Err(RecommendationError::EmptyQuery);
        }

        Ok(GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: query.catalog_context.clone(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        })
    }
}

#[async_trait]
impl Recommender for GeminiRecommender {
    async fn recommend(&self, query: &RecommendationQuery) -> Result<RecommendationReply, RecommendationError> {
        let api_key = self.api_key.as_deref().ok_or(RecommendationError::MissingApiKey)?;
        let body = Self::build_request(query)?;

        debug!(model = %self.model, has_audio = query.audio_base64.is_some(), "calling Gemini");
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RecommendationError::Status {
                status: status.as_u16(),
                message: error_message(&body_text),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = extract_text(parsed).ok_or(RecommendationError::EmptyResponse)?;
        parse_reply(&text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let parts = response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {msg}"),
                _ => msg,
            }
        }
        Err(_) => body.to_string(),
    }
}

/// Shape the model is asked to answer in. Mirrors what `parse_reply` accepts.
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "text": { "type": "STRING" },
            "recommendations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "sku": { "type": "STRING" },
                        "name": { "type": "STRING" },
                        "brand": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "reason": { "type": "STRING" },
                        "specs": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["sku", "name"]
                }
            },
            "clarification_form": {
                "type": "OBJECT",
                "nullable": true,
                "properties": {
                    "question": { "type": "STRING" },
                    "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "free_text_placeholder": { "type": "STRING" }
                },
                "required": ["question", "options"]
            }
        },
        "required": ["text"]
    })
}

// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A product suggested by the model. Taken as returned, apart from the
/// presence checks done when the reply is parsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecommendation {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub specs: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClarificationForm {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_text_placeholder: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<ProductRecommendation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_form: Option<ClarificationForm>,
    #[serde(default)]
    pub form_submitted: bool,
    #[serde(default)]
    pub has_audio: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            recommendations: None,
            clarification_form: None,
            form_submitted: false,
            has_audio: false,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn user_audio(content: impl Into<String>) -> Self {
        Self {
            has_audio: true,
            ..Self::new(MessageRole::User, content)
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn assistant_reply(reply: RecommendationReply) -> Self {
        let recommendations = (!reply.recommendations.is_empty()).then_some(reply.recommendations);
        Self {
            recommendations,
            clarification_form: reply.clarification_form,
            ..Self::new(MessageRole::Assistant, reply.text)
        }
    }
}

/// What the recommendation service is asked for one turn.
#[derive(Clone, Debug)]
pub struct RecommendationQuery {
    pub text: String,
    pub catalog_context: String,
    pub audio_base64: Option<String>,
}

/// A validated reply from the recommendation service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecommendationReply {
    pub text: String,
    pub recommendations: Vec<ProductRecommendation>,
    pub clarification_form: Option<ClarificationForm>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub selected_options: Vec<String>,
    #[serde(default)]
    pub additional_info: String,
}

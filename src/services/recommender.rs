// src/services/recommender.rs
//! Contract with the external recommendation service and validation of
//! what it sends back.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{ClarificationForm, ProductRecommendation, RecommendationQuery, RecommendationReply};

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("no API key configured for the recommendation service")]
    MissingApiKey,
    #[error("query has neither text nor audio")]
    EmptyQuery,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("service returned no content")]
    EmptyResponse,
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid reply: {0}")]
    InvalidReply(String),
}

#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, query: &RecommendationQuery) -> Result<RecommendationReply, RecommendationError>;
}

#[derive(Deserialize)]
struct RawReply {
    #[serde(default)]
    text: String,
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
    #[serde(default)]
    clarification_form: Option<RawForm>,
}

#[derive(Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    sku: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    specs: Vec<String>,
}

#[derive(Deserialize)]
struct RawForm {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    free_text_placeholder: Option<String>,
}

/// Parses the model's JSON reply. Tolerates a surrounding Markdown code
/// fence; rejects anything that cannot be shown to the user as-is.
pub fn parse_reply(raw: &str) -> Result<RecommendationReply, RecommendationError> {
    let reply: RawReply = serde_json::from_str(strip_code_fence(raw))?;

    let recommendations = reply
        .recommendations
        .into_iter()
        .map(validate_recommendation)
        .collect::<Result<Vec<_>, _>>()?;

    let clarification_form = reply.clarification_form.map(validate_form).transpose()?;

    let text = reply.text.trim().to_string();
    if text.is_empty() && recommendations.is_empty() && clarification_form.is_none() {
        return Err(RecommendationError::InvalidReply("reply is empty".into()));
    }

    Ok(RecommendationReply {
        text,
        recommendations,
        clarification_form,
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the optional language tag on the opening line
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn validate_recommendation(raw: RawRecommendation) -> Result<ProductRecommendation, RecommendationError> {
    let sku = raw.sku.trim().to_string();
    let name = raw.name.trim().to_string();
    if sku.is_empty() {
        return Err(RecommendationError::InvalidReply(format!(
            "recommendation {name:?} has no SKU"
        )));
    }
    if name.is_empty() {
        return Err(RecommendationError::InvalidReply(format!(
            "recommendation {sku} has no name"
        )));
    }

    Ok(ProductRecommendation {
        sku,
        name,
        brand: raw.brand.trim().to_string(),
        description: raw.description.trim().to_string(),
        reason: raw.reason.trim().to_string(),
        specs: raw
            .specs
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    })
}

fn validate_form(raw: RawForm) -> Result<ClarificationForm, RecommendationError> {
    let question = raw.question.trim().to_string();
    if question.is_empty() {
        return Err(RecommendationError::InvalidReply(
            "clarification form has no question".into(),
        ));
    }

    let mut seen = HashSet::new();
    let options: Vec<String> = raw
        .options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty() && seen.insert(o.clone()))
        .collect();
    if options.is_empty() {
        return Err(RecommendationError::InvalidReply(
            "clarification form has no options".into(),
        ));
    }

    Ok(ClarificationForm {
        question,
        options,
        free_text_placeholder: raw
            .free_text_placeholder
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    })
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tool_advisor_backend::config::Config;
use tool_advisor_backend::models::{
    ClarificationForm, ProductRecommendation, RecommendationQuery, RecommendationReply,
};
use tool_advisor_backend::services::recommender::{RecommendationError, Recommender};
use tool_advisor_backend::state::AppState;

/// Answers from a queue and records every query it receives. An empty queue
/// behaves like a failing service.
#[derive(Default)]
pub struct ScriptedRecommender {
    replies: Mutex<VecDeque<Result<RecommendationReply, RecommendationError>>>,
    queries: Mutex<Vec<RecommendationQuery>>,
}

impl ScriptedRecommender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_reply(&self, reply: RecommendationReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_error(&self, err: RecommendationError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn queries(&self) -> Vec<RecommendationQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recommender for ScriptedRecommender {
    async fn recommend(&self, query: &RecommendationQuery) -> Result<RecommendationReply, RecommendationError> {
        self.queries.lock().unwrap().push(query.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RecommendationError::EmptyResponse))
    }
}

/// Holds every call until `release` is notified.
#[derive(Default)]
pub struct GatedRecommender {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl Recommender for GatedRecommender {
    async fn recommend(&self, _query: &RecommendationQuery) -> Result<RecommendationReply, RecommendationError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(text_reply("pronto"))
    }
}

pub fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        catalog_dir: dir.path().join("catalogs"),
        admin_key: Some("test-admin".to_string()),
        ..Default::default()
    }
}

pub fn state_with(dir: &tempfile::TempDir, recommender: Arc<dyn Recommender>) -> Arc<AppState> {
    Arc::new(AppState::with_recommender(&test_config(dir), recommender))
}

pub fn text_reply(text: &str) -> RecommendationReply {
    RecommendationReply {
        text: text.to_string(),
        ..Default::default()
    }
}

pub fn recommendation_reply() -> RecommendationReply {
    RecommendationReply {
        text: "Para cozinha industrial recomendo a escova multiuso em PBT.".to_string(),
        recommendations: vec![ProductRecommendation {
            sku: "4002W".to_string(),
            name: "Escova Multiuso (Punho Curto)".to_string(),
            brand: "El Castor".to_string(),
            description: "Cerdas PBT, 20,8cm".to_string(),
            reason: "Resiste a 120°C".to_string(),
            specs: vec!["PBT".to_string()],
        }],
        clarification_form: None,
    }
}

pub fn form_reply() -> RecommendationReply {
    RecommendationReply {
        text: "Preciso de mais detalhes.".to_string(),
        recommendations: vec![],
        clarification_form: Some(ClarificationForm {
            question: "Qual o ambiente?".to_string(),
            options: vec![
                "Cozinha industrial".to_string(),
                "Banheiro".to_string(),
                "Área externa".to_string(),
            ],
            free_text_placeholder: Some("Temperatura, tipo de sujeira...".to_string()),
        }),
    }
}

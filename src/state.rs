// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::catalog_store::CatalogStore;
use crate::services::gemini::GeminiRecommender;
use crate::services::metrics_manager::MetricsManager;
use crate::services::recommender::Recommender;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
    pub metrics: MetricsManager,
    pub catalogs: CatalogStore,
    pub recommender: Arc<dyn Recommender>,
    pub admin_key: Option<String>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_recommender(config, Arc::new(GeminiRecommender::new(&config.gemini)))
    }

    pub fn with_recommender(config: &Config, recommender: Arc<dyn Recommender>) -> Self {
        Self {
            sessions: SessionManager::new(config.session_ttl),
            metrics: MetricsManager::new(),
            catalogs: CatalogStore::new(config.catalog_dir.clone()),
            recommender,
            admin_key: config.admin_key.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

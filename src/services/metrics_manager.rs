// src/services/metrics_manager.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::catalog::CatalogScope;

/// How a chat turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    Recommended,
    Clarification,
    Fallback,
}

impl TurnOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnOutcome::Answered => "answered",
            TurnOutcome::Recommended => "recommended",
            TurnOutcome::Clarification => "clarification",
            TurnOutcome::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MetricsData {
    pub catalog_usage: HashMap<String, u64>,
    pub outcome_usage: HashMap<String, u64>,
    pub form_submissions: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn increment_catalog(&self, scope: CatalogScope) {
        let mut data = self.inner.write().await;
        *data.catalog_usage.entry(scope.as_str().to_string()).or_insert(0) += 1;
    }

    pub async fn increment_outcome(&self, outcome: TurnOutcome) {
        let mut data = self.inner.write().await;
        *data.outcome_usage.entry(outcome.as_str().to_string()).or_insert(0) += 1;
    }

    pub async fn increment_form_submissions(&self) {
        self.inner.write().await.form_submissions += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}

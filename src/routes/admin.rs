// src/routes/admin.rs
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    message::{CatalogUpload, MetricsReport},
    services::{
        catalog::Vendor,
        catalog_store::CatalogFile,
    },
    state::SharedState,
};

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsReport> {
    Json(MetricsReport {
        active_sessions: state.sessions.len().await,
        metrics: state.metrics.get_metrics().await,
    })
}

pub async fn put_catalog_handler(
    State(state): State<SharedState>,
    Path(vendor): Path<Vendor>,
    Json(upload): Json<CatalogUpload>,
) -> Result<Json<CatalogFile>, AppError> {
    if upload.content.trim().is_empty() {
        return Err(AppError::BadRequest("catalog content cannot be empty".to_string()));
    }
    let name = match upload.name.trim() {
        "" => format!("{vendor}.txt"),
        name => name.to_string(),
    };

    let file = CatalogFile::new(vendor, name, upload.content);
    state.catalogs.put(&file).await?;
    Ok(Json(file))
}

pub async fn get_catalog_handler(
    State(state): State<SharedState>,
    Path(vendor): Path<Vendor>,
) -> Result<Json<CatalogFile>, AppError> {
    state
        .catalogs
        .get(vendor)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no catalog override stored for {vendor}")))
}

// src/services/catalog_store.rs
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::catalog::{CatalogScope, CatalogTexts, Vendor};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt catalog file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// An uploaded catalog that replaces a vendor's built-in text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub id: Vendor,
    pub name: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

impl CatalogFile {
    pub fn new(id: Vendor, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            content: content.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// One JSON file per vendor under `dir`. The directory is created on the
/// first write.
#[derive(Clone, Debug)]
pub struct CatalogStore {
    dir: PathBuf,
}

impl CatalogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, vendor: Vendor) -> PathBuf {
        self.dir.join(format!("{}.json", vendor.as_str()))
    }

    pub async fn put(&self, file: &CatalogFile) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(file)?;
        tokio::fs::write(self.path_for(file.id), json).await?;
        info!(vendor = %file.id, name = %file.name, "catalog override stored");
        Ok(())
    }

    pub async fn get(&self, vendor: Vendor) -> Result<Option<CatalogFile>, StoreError> {
        let bytes = match tokio::fs::read(self.path_for(vendor)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Catalog texts for the vendors in `scope`, preferring stored overrides.
    /// A failed read falls back to the built-in text.
    pub async fn texts_for(&self, scope: CatalogScope) -> CatalogTexts {
        let mut texts = CatalogTexts::builtin();
        for vendor in scope.vendors() {
            match self.get(*vendor).await {
                Ok(Some(file)) => texts.set(*vendor, file.content),
                Ok(None) => {}
                Err(err) => {
                    warn!(vendor = %vendor, error = %err, "failed to read catalog override, using built-in text");
                }
            }
        }
        texts
    }

    pub async fn context_for(&self, scope: CatalogScope) -> String {
        scope.context(&self.texts_for(scope).await)
    }
}

// src/config.rs
use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request body cap. Recorded audio arrives base64-encoded inside the JSON
/// body, so this sits well above axum's 2 MB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub session_ttl: Duration,
    pub catalog_dir: PathBuf,
    pub admin_key: Option<String>,
    pub max_body_bytes: usize,
    pub gemini: GeminiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            session_ttl: Duration::from_secs(3600),
            catalog_dir: PathBuf::from("data/catalogs"),
            admin_key: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but with the variables supplied by `lookup`.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let session_ttl = match var("SESSION_TTL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("SESSION_TTL_SECS must be a number of seconds, got {raw:?}"))?,
            ),
            None => defaults.session_ttl,
        };

        let max_body_bytes = match var("MAX_BODY_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("MAX_BODY_BYTES must be a byte count, got {raw:?}"))?,
            None => defaults.max_body_bytes,
        };

        let gemini = GeminiConfig {
            api_key: var("GEMINI_API_KEY").or_else(|| var("API_KEY")),
            model: var("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
            base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url),
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_ttl,
            catalog_dir: var("CATALOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_dir),
            admin_key: var("ADMIN_KEY"),
            max_body_bytes,
            gemini,
        })
    }
}

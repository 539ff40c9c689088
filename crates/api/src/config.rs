use std::env;

use anyhow::{Context, Result};
use sift_strategy::{parse_flag, DelegateConfig};

const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Service configuration, sourced from the environment and an optional
/// `.env` file.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    /// Loose schema: `{"text": ""}` is classified instead of rejected.
    pub allow_empty_text: bool,
    /// Empty means any origin without credentials.
    pub allowed_origins: Vec<String>,
    pub delegate: DelegateConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            allow_empty_text: false,
            allowed_origins: Vec::new(),
            delegate: DelegateConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let allow_empty_text = match env::var("SIFT_ALLOW_EMPTY_TEXT") {
            Ok(value) => parse_flag(&value)
                .with_context(|| format!("SIFT_ALLOW_EMPTY_TEXT is not a boolean: {value}"))?,
            Err(_) => false,
        };

        Ok(Self {
            bind: env::var("SIFT_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            allow_empty_text,
            allowed_origins: parse_allowed_origins(
                env::var("SIFT_ALLOWED_ORIGINS").ok().as_deref(),
            ),
            delegate: DelegateConfig::from_env(),
        })
    }

    pub fn rules_only() -> Self {
        Self {
            delegate: DelegateConfig::rules_only(),
            ..Self::default()
        }
    }
}

fn parse_allowed_origins(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}

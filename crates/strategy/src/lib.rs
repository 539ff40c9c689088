mod config;
mod error;
mod fallback;
mod openai;
mod response;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sift_core::{Extraction, ExtractionResult, ExtractionSource, RuleSet};
use tracing::info;

pub use config::{parse_flag, DelegateConfig};
pub use error::DelegateError;
pub use fallback::DelegatedStrategy;
pub use openai::OpenAiDelegate;
pub use response::{first_json_object, parse_delegate_output};

/// External extractor consulted before the rules.
#[async_trait]
pub trait FieldDelegate: Send + Sync {
    fn model_name(&self) -> &str;
    async fn extract(&self, text: &str) -> Result<ExtractionResult, DelegateError>;
}

/// How a request's fields get produced. Implementations never fail: a
/// missing field is a `None`, not an error.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn delegate_active(&self) -> bool;
    async fn extract(&self, text: &str) -> Extraction;
}

#[derive(Debug, Clone)]
pub struct RuleStrategy {
    rules: Arc<RuleSet>,
}

impl RuleStrategy {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl ExtractionStrategy for RuleStrategy {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn delegate_active(&self) -> bool {
        false
    }

    async fn extract(&self, text: &str) -> Extraction {
        Extraction {
            result: self.rules.extract(text),
            source: ExtractionSource::Rules,
        }
    }
}

#[derive(Clone)]
pub struct SiftStack {
    pub rules: Arc<RuleSet>,
    pub strategy: Arc<dyn ExtractionStrategy>,
    pub delegate_enabled: bool,
}

impl SiftStack {
    pub fn load(config: &DelegateConfig) -> Result<Self> {
        let rules = Arc::new(RuleSet::try_default().context("failed to compile extraction rules")?);

        match OpenAiDelegate::from_config(config).context("failed to build delegate client")? {
            Some(delegate) => {
                info!(
                    model = %config.model,
                    timeout_secs = config.timeout.as_secs(),
                    "delegate extraction enabled"
                );
                Ok(Self::with_delegate(rules, Arc::new(delegate), config))
            }
            None => {
                info!(
                    flag = config.enabled,
                    credential = config.api_key.is_some(),
                    "delegate extraction disabled, using rules only"
                );
                Ok(Self::rules_only(rules))
            }
        }
    }

    pub fn rules_only(rules: Arc<RuleSet>) -> Self {
        Self {
            strategy: Arc::new(RuleStrategy::new(rules.clone())),
            rules,
            delegate_enabled: false,
        }
    }

    pub fn with_delegate(
        rules: Arc<RuleSet>,
        delegate: Arc<dyn FieldDelegate>,
        config: &DelegateConfig,
    ) -> Self {
        Self {
            strategy: Arc::new(DelegatedStrategy::new(
                delegate,
                rules.clone(),
                config.timeout,
            )),
            rules,
            delegate_enabled: true,
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sift_core::{Extraction, ExtractionSource, RuleSet};
use tracing::{instrument, warn};

use crate::error::DelegateError;
use crate::{ExtractionStrategy, FieldDelegate};

/// Tries the delegate first and answers from the rules when it fails.
///
/// The two results are never merged: a delegate answer is taken whole, and
/// any failure discards it in favour of the full rule pipeline.
#[derive(Clone)]
pub struct DelegatedStrategy {
    delegate: Arc<dyn FieldDelegate>,
    rules: Arc<RuleSet>,
    timeout: Duration,
}

impl DelegatedStrategy {
    pub fn new(delegate: Arc<dyn FieldDelegate>, rules: Arc<RuleSet>, timeout: Duration) -> Self {
        Self {
            delegate,
            rules,
            timeout,
        }
    }

    fn fall_back(&self, text: &str, err: &DelegateError) -> Extraction {
        warn!(
            model = %self.delegate.model_name(),
            kind = err.kind(),
            error = %err,
            "delegate extraction failed, falling back to rules"
        );
        Extraction {
            result: self.rules.extract(text),
            source: ExtractionSource::Fallback,
        }
    }
}

#[async_trait]
impl ExtractionStrategy for DelegatedStrategy {
    fn name(&self) -> &'static str {
        "delegated"
    }

    fn delegate_active(&self) -> bool {
        true
    }

    #[instrument(skip_all, fields(chars = text.len()))]
    async fn extract(&self, text: &str) -> Extraction {
        match tokio::time::timeout(self.timeout, self.delegate.extract(text)).await {
            Ok(Ok(result)) => Extraction {
                result,
                source: ExtractionSource::Delegate,
            },
            Ok(Err(err)) => self.fall_back(text, &err),
            Err(_) => self.fall_back(text, &DelegateError::Timeout(self.timeout)),
        }
    }
}

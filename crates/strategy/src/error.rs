use std::time::Duration;

use thiserror::Error;

/// Failures of the language-model delegate. All of them are recovered by
/// falling back to the rule engine.
#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("delegate request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("delegate did not answer within {0:?}")]
    Timeout(Duration),

    #[error("delegate returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("delegate completion had no content")]
    EmptyCompletion,

    #[error("delegate output is not a JSON object: {0}")]
    MalformedOutput(String),
}

impl DelegateError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(err) if err.is_timeout() => "timeout",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::EmptyCompletion => "empty_completion",
            Self::MalformedOutput(_) => "malformed_output",
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sift_core::ExtractionResult;
use tracing::debug;

use crate::config::DelegateConfig;
use crate::error::DelegateError;
use crate::response::parse_delegate_output;
use crate::FieldDelegate;

const MAX_OUTPUT_TOKENS: u32 = 200;
const MAX_ERROR_BODY: usize = 300;

const SYSTEM_PROMPT: &str = "You extract structured fields from short customer requests. \
Answer with a single JSON object and nothing else.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client that asks the model for the four fields.
#[derive(Clone)]
pub struct OpenAiDelegate {
    http_client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiDelegate {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, DelegateError> {
        let http_client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(6)))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    /// `None` when the config leaves the delegate inactive.
    pub fn from_config(config: &DelegateConfig) -> Result<Option<Self>, DelegateError> {
        if !config.is_active() {
            return Ok(None);
        }
        let Some(api_key) = config.api_key.as_deref() else {
            return Ok(None);
        };
        Self::new(api_key, config.model.as_str(), &config.base_url, config.timeout).map(Some)
    }
}

#[async_trait]
impl FieldDelegate for OpenAiDelegate {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn extract(&self, text: &str) -> Result<ExtractionResult, DelegateError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(text),
                },
            ],
            temperature: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(DelegateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(body_error)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(DelegateError::EmptyCompletion)?;

        debug!(model = %self.model, chars = content.len(), "delegate completion received");
        parse_delegate_output(&content)
    }
}

fn user_prompt(text: &str) -> String {
    format!(
        "Read the text below and return ONLY a JSON object with exactly these keys:\n\
         - \"zip\": postal or ZIP code (US 5 digit, ZIP+4, Canadian, or other formats)\n\
         - \"brand\": brand name, e.g. Nike, Apple, Samsung\n\
         - \"category\": product or service category, e.g. shoes, electronics, clothing\n\
         - \"time_pref\": delivery time preference, e.g. \"tomorrow\", \"evening\", \"next week\"\n\
         Use null for anything the text does not mention.\n\n\
         Text: \"{text}\"\n\n\
         Example: {{\"zip\": \"10001\", \"brand\": \"Nike\", \"category\": \"shoes\", \"time_pref\": \"tomorrow evening\"}}"
    )
}

fn body_error(err: reqwest::Error) -> DelegateError {
    if err.is_decode() {
        DelegateError::MalformedOutput(format!("undecodable completion body: {err}"))
    } else {
        DelegateError::Transport(err)
    }
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    if text.len() <= max {
        return text.len();
    }
    (0..=max)
        .rev()
        .find(|idx| text.is_char_boundary(*idx))
        .unwrap_or(0)
}

//! Page-question adapter.
//!
//! One [`AskRequest`] is classified into a [`RequestMode`], turned into the
//! matching upstream payload, sent once, and the reply is reduced to a
//! [`UnifiedResult`] with normalized token usage.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::logging::format_bytes;

pub mod error;
pub mod extract;
pub mod image;
pub mod payload;
pub mod prompt;
pub mod request;
pub mod transport;
pub mod usage;

pub use error::AskError;
pub use payload::UpstreamPayload;
pub use request::{AskRequest, RequestMode, classify};
pub use usage::{UnifiedResult, Usage};

pub const API_KEY_ENV: &str = "LLM_API_KEY";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

/// Upstream settings shared by every request handled by one process.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub chat_url: String,
    pub responses_url: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            responses_url: DEFAULT_RESPONSES_URL.to_string(),
        }
    }
}

impl AssistantConfig {
    pub fn endpoint(&self, mode: RequestMode) -> &str {
        if mode.is_chat() {
            &self.chat_url
        } else {
            &self.responses_url
        }
    }

    pub fn api_key_present(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// A validated request with its encoded upstream body, ready to send.
#[derive(Debug)]
pub struct PreparedRequest {
    pub mode: RequestMode,
    pub endpoint: String,
    pub payload: UpstreamPayload,
    pub body: Vec<u8>,
}

/// Validates, classifies and encodes `request` without touching the network.
pub fn prepare(
    request: &AskRequest,
    config: &AssistantConfig,
) -> Result<PreparedRequest, AskError> {
    request.validate()?;
    let mode = request.mode();
    let payload = payload::build(request, mode, &config.model)?;
    let body = payload.to_bytes()?;

    Ok(PreparedRequest {
        mode,
        endpoint: config.endpoint(mode).to_string(),
        payload,
        body,
    })
}

/// Answers one request with a single upstream call.
pub fn ask(request: &AskRequest, config: &AssistantConfig) -> Result<UnifiedResult, AskError> {
    let started = Instant::now();
    request.validate()?;

    let api_key = config
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or(AskError::MissingCredential {
            key_env: API_KEY_ENV,
        })?;

    let prepared = prepare(request, config)?;
    info!(
        mode = prepared.mode.as_str(),
        question_chars = request.question.chars().count(),
        "handling ask request"
    );
    let screenshot_size = request.screenshot().map(|s| format_bytes(s.len()));
    let content_size = request.page_content().map(|c| format_bytes(c.len()));
    debug!(
        url = %request.url,
        screenshot = screenshot_size.as_deref().unwrap_or("none"),
        page_content = content_size.as_deref().unwrap_or("none"),
        use_web_search = request.use_web_search,
        is_simple = request.is_simple,
        payload = %format_bytes(prepared.body.len()),
        endpoint = %prepared.endpoint,
        "ask request details"
    );

    let outcome = transport::send(&prepared.endpoint, api_key, prepared.body)
        .and_then(|response| extract::extract(prepared.mode, &response));

    match &outcome {
        Ok(result) => debug!(
            prompt_tokens = result.usage.prompt_tokens,
            completion_tokens = result.usage.completion_tokens,
            total_tokens = result.usage.total_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ask request completed"
        ),
        Err(err) => warn!(
            error = %err,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ask request failed"
        ),
    }
    outcome
}

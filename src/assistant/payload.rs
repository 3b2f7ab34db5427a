use serde::Serialize;

use crate::assistant::error::AskError;
use crate::assistant::image::normalize_image;
use crate::assistant::prompt::{self, SYSTEM_PROMPT};
use crate::assistant::request::{AskRequest, RequestMode};

pub const TEMPERATURE: f32 = 0.7;
pub const SIMPLE_MAX_TOKENS: u32 = 500;
pub const DETAILED_MAX_TOKENS: u32 = 2000;
pub const IMAGE_DETAIL: &str = "low";
pub const WEB_SEARCH_TOOL: &str = "web_search_preview";

/// Request body for one upstream call, in the shape its mode requires.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UpstreamPayload {
    Chat(ChatCompletionRequest),
    Responses(ResponsesRequest),
}

impl UpstreamPayload {
    pub fn to_bytes(&self) -> Result<Vec<u8>, AskError> {
        serde_json::to_vec(self).map_err(AskError::Serialization)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
    pub detail: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: String,
    pub tools: Vec<ResponsesTool>,
}

#[derive(Debug, Serialize)]
pub struct ResponsesTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(content.into()),
        }
    }

    fn user(content: MessageContent) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Builds a fresh payload for `request` in `mode`.
pub fn build(
    request: &AskRequest,
    mode: RequestMode,
    model: &str,
) -> Result<UpstreamPayload, AskError> {
    match mode {
        RequestMode::WebSearch => Ok(UpstreamPayload::Responses(ResponsesRequest {
            model: model.to_string(),
            input: prompt::web_search_input(request),
            tools: vec![ResponsesTool {
                kind: WEB_SEARCH_TOOL,
            }],
        })),
        RequestMode::PlainText => {
            let text = prompt::build(request, mode);
            Ok(chat_request(request, model, MessageContent::Text(text)))
        }
        RequestMode::Vision => {
            let screenshot = request.screenshot().ok_or_else(|| {
                AskError::Validation("vision mode requires a screenshot".to_string())
            })?;
            let url = normalize_image(screenshot)?;
            let text = prompt::build(request, mode);
            let parts = vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url,
                        detail: IMAGE_DETAIL,
                    },
                },
            ];
            Ok(chat_request(request, model, MessageContent::Parts(parts)))
        }
    }
}

fn chat_request(request: &AskRequest, model: &str, user: MessageContent) -> UpstreamPayload {
    UpstreamPayload::Chat(ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
        temperature: TEMPERATURE,
        max_tokens: max_tokens(request.is_simple),
    })
}

pub fn max_tokens(is_simple: bool) -> u32 {
    if is_simple {
        SIMPLE_MAX_TOKENS
    } else {
        DETAILED_MAX_TOKENS
    }
}

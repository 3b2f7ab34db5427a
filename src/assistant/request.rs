use serde::{Deserialize, Serialize};

use crate::assistant::error::AskError;

/// One client question about a web page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AskRequest {
    pub question: String,
    pub url: String,
    pub title: String,
    /// Plain text, or JSON with `headings` and `paragraphs` arrays.
    pub page_content: Option<String>,
    /// Base64 image, with or without a `data:` prefix.
    pub screenshot: Option<String>,
    pub use_web_search: bool,
    pub is_simple: bool,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), AskError> {
        if self.question.trim().is_empty() {
            return Err(AskError::Validation("question must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn page_content(&self) -> Option<&str> {
        self.page_content
            .as_deref()
            .filter(|content| !content.trim().is_empty())
    }

    pub fn screenshot(&self) -> Option<&str> {
        self.screenshot
            .as_deref()
            .filter(|screenshot| !screenshot.is_empty())
    }

    pub fn mode(&self) -> RequestMode {
        classify(self.use_web_search, self.screenshot().is_some())
    }
}

/// Upstream request shape chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    PlainText,
    Vision,
    WebSearch,
}

impl RequestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Vision => "vision",
            Self::WebSearch => "web_search",
        }
    }

    /// Whether the mode talks to the chat-completions endpoint.
    pub fn is_chat(self) -> bool {
        !matches!(self, Self::WebSearch)
    }
}

/// Web search wins over a screenshot; without either the request is plain text.
pub fn classify(use_web_search: bool, screenshot_present: bool) -> RequestMode {
    if use_web_search {
        RequestMode::WebSearch
    } else if screenshot_present {
        RequestMode::Vision
    } else {
        RequestMode::PlainText
    }
}

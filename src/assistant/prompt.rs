use serde::Deserialize;
use serde_json::Value;

use crate::assistant::request::{AskRequest, RequestMode};

pub const MAX_HEADINGS: usize = 5;
pub const MAX_PARAGRAPHS: usize = 3;
pub const MAX_PLAIN_CONTENT_CHARS: usize = 2000;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about the web page the user is reading.";

const CONCISE_DIRECTIVE: &str = "Answer concisely in no more than 100 words. Give the conclusion directly and do not explain your process.";
const ROLE_DIRECTIVE: &str = "You are a professional web page analysis assistant. Analyze the page content and screenshot the user provides and answer the question from what the page says. If the provided material does not contain the answer, say so honestly.";
const DETAILED_DIRECTIVE: &str = "Give a detailed, well-structured answer. Use lists and headings where they help and explain how you reached your conclusion.";
const VISION_NOTE: &str = "A screenshot of the page is attached.";
const CONCISE_REMINDER: &str = "Remember: keep the answer short and do not elaborate.";

const MORE_HEADINGS: &str = "...(more headings omitted)";
const MORE_PARAGRAPHS: &str = "...(more content omitted)";
const CONTENT_TRUNCATED: &str = "...(content truncated)";

/// Page content captured as outline pieces.
#[derive(Debug, Deserialize)]
struct StructuredContent {
    #[serde(default)]
    headings: Vec<Value>,
    #[serde(default)]
    paragraphs: Vec<Value>,
}

impl StructuredContent {
    fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        if !value.is_object() {
            return None;
        }
        Self::deserialize(&value).ok()
    }
}

/// Builds the user-facing prompt text for `mode`.
///
/// Web search only forwards the question, prefixed with the concision
/// directive for simple answers; the other modes get the full page template.
pub fn build(request: &AskRequest, mode: RequestMode) -> String {
    if mode == RequestMode::WebSearch {
        return web_search_input(request);
    }

    let mut prompt = String::new();
    if request.is_simple {
        prompt.push_str(CONCISE_DIRECTIVE);
        prompt.push_str("\n\n");
    }

    prompt.push_str(ROLE_DIRECTIVE);
    if !request.is_simple {
        prompt.push('\n');
        prompt.push_str(DETAILED_DIRECTIVE);
    }
    if mode == RequestMode::Vision {
        prompt.push('\n');
        prompt.push_str(VISION_NOTE);
    }

    if let Some(content) = request.page_content() {
        prompt.push_str("\n\nPage content:\n");
        match StructuredContent::parse(content) {
            Some(structured) => push_structured(&mut prompt, &structured),
            None => push_plain(&mut prompt, content),
        }
    }

    prompt.push_str("\n\nQuestion: ");
    prompt.push_str(request.question.trim());
    if !request.title.is_empty() {
        prompt.push_str("\nPage title: ");
        prompt.push_str(&request.title);
    }
    if !request.url.is_empty() {
        prompt.push_str("\nPage URL: ");
        prompt.push_str(&request.url);
    }

    if request.is_simple {
        prompt.push_str("\n\n");
        prompt.push_str(CONCISE_REMINDER);
    }
    prompt
}

pub fn web_search_input(request: &AskRequest) -> String {
    let question = request.question.trim();
    if request.is_simple {
        format!("{CONCISE_DIRECTIVE}\n\n{question}")
    } else {
        question.to_string()
    }
}

fn push_structured(prompt: &mut String, content: &StructuredContent) {
    if !content.headings.is_empty() {
        prompt.push_str("Headings:\n");
        for heading in content.headings.iter().take(MAX_HEADINGS) {
            prompt.push_str("- ");
            prompt.push_str(&item_text(heading));
            prompt.push('\n');
        }
        if content.headings.len() > MAX_HEADINGS {
            prompt.push_str(MORE_HEADINGS);
            prompt.push('\n');
        }
    }

    if !content.paragraphs.is_empty() {
        if !content.headings.is_empty() {
            prompt.push('\n');
        }
        prompt.push_str("Paragraphs:\n");
        for paragraph in content.paragraphs.iter().take(MAX_PARAGRAPHS) {
            prompt.push_str(&item_text(paragraph));
            prompt.push_str("\n\n");
        }
        if content.paragraphs.len() > MAX_PARAGRAPHS {
            prompt.push_str(MORE_PARAGRAPHS);
            prompt.push('\n');
        }
    }

    while prompt.ends_with('\n') {
        prompt.pop();
    }
}

fn push_plain(prompt: &mut String, content: &str) {
    match truncate_chars(content, MAX_PLAIN_CONTENT_CHARS) {
        Some(head) => {
            prompt.push_str(head);
            prompt.push_str(CONTENT_TRUNCATED);
        }
        None => prompt.push_str(content),
    }
}

fn item_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Returns the first `max` characters when `text` is longer than that.
fn truncate_chars(text: &str, max: usize) -> Option<&str> {
    text.char_indices().nth(max).map(|(idx, _)| &text[..idx])
}

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::assistant::error::AskError;
use crate::assistant::request::RequestMode;
use crate::assistant::transport::RawResponse;
use crate::assistant::usage::{self, UnifiedResult};

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputContent {
    OutputText { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

/// Turns an upstream reply into an answer with usage, or the error it describes.
pub fn extract(mode: RequestMode, response: &RawResponse) -> Result<UnifiedResult, AskError> {
    if !response.status.is_success() {
        return Err(upstream_error(response));
    }

    let root: Value = serde_json::from_slice(&response.body).map_err(|err| {
        AskError::Extraction(format!("response body is not valid JSON: {err}"))
    })?;

    let answer = match mode {
        RequestMode::PlainText | RequestMode::Vision => chat_answer(&root),
        RequestMode::WebSearch => responses_answer(&root),
    };
    let answer = answer
        .filter(|answer| !answer.trim().is_empty())
        .ok_or_else(|| {
            AskError::Extraction(format!(
                "no answer text found in {} response",
                mode.as_str()
            ))
        })?;

    Ok(UnifiedResult {
        answer,
        usage: usage::normalize(&root),
    })
}

fn chat_answer(root: &Value) -> Option<String> {
    match ChatCompletionBody::deserialize(root) {
        Ok(body) => body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content),
        Err(err) => {
            debug!(error = %err, "chat response did not match schema, trying key lookup");
            root.pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string)
        }
    }
}

fn responses_answer(root: &Value) -> Option<String> {
    match ResponsesBody::deserialize(root) {
        Ok(body) => body.output.into_iter().find_map(|item| match item {
            OutputItem::Message { content } => content.into_iter().find_map(|part| match part {
                OutputContent::OutputText { text } if !text.is_empty() => Some(text),
                _ => None,
            }),
            OutputItem::Other => None,
        }),
        Err(err) => {
            debug!(error = %err, "responses body did not match schema, scanning output");
            scan_output(root)
        }
    }
}

/// Looks only at `output[].content[]`; nothing deeper is visited.
fn scan_output(root: &Value) -> Option<String> {
    let output = root.get("output")?.as_array()?;
    output
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("message"))
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .find_map(|content| {
            content
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .find(|text| !text.is_empty())
                .map(str::to_string)
        })
}

fn upstream_error(response: &RawResponse) -> AskError {
    let status = response.status;
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(&response.body) {
        let detail = envelope.error;
        if !detail.message.is_empty() {
            let code = detail.code.as_ref().map(Value::to_string).unwrap_or_default();
            warn!(
                %status,
                kind = detail.kind.as_deref().unwrap_or("unknown"),
                code = %code,
                "upstream returned an error"
            );
            return AskError::Upstream {
                status,
                message: detail.message,
            };
        }
    }

    let body = response.body_text();
    warn!(%status, body = %body, "upstream returned an unstructured error");
    AskError::Upstream {
        status,
        message: if body.trim().is_empty() {
            format!("status {}", status.as_u16())
        } else {
            body
        },
    }
}

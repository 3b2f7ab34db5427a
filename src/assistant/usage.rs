use serde::Serialize;
use serde_json::Value;

/// Token accounting in one shape regardless of upstream field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Final answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedResult {
    pub answer: String,
    pub usage: Usage,
}

/// Reads `usage` from a decoded upstream body. Missing counters are zero.
pub fn normalize(root: &Value) -> Usage {
    let Some(usage) = root.get("usage") else {
        return Usage::default();
    };

    Usage {
        prompt_tokens: counter(usage, &["prompt_tokens", "input_tokens"]),
        completion_tokens: counter(usage, &["completion_tokens", "output_tokens"]),
        total_tokens: counter(usage, &["total_tokens"]),
    }
}

fn counter(usage: &Value, keys: &[&str]) -> u64 {
    keys.iter()
        .filter_map(|key| usage.get(*key))
        .find_map(|value| {
            value
                .as_u64()
                .or_else(|| value.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
        })
        .unwrap_or(0)
}

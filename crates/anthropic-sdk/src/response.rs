//! Response types for the Messages API.

use crate::streaming::DeltaUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete (non-streamed) message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message identifier.
    pub id: String,
    /// Object type (always "message").
    #[serde(rename = "type", default)]
    pub object_type: String,
    /// Always `assistant`.
    pub role: String,
    /// Content blocks as returned by the API.
    #[serde(default)]
    pub content: Vec<Value>,
    /// Model that produced the message.
    pub model: String,
    /// Why generation stopped.
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// The stop sequence that was hit.
    #[serde(default)]
    pub stop_sequence: Option<String>,
    /// Token usage statistics.
    #[serde(default)]
    pub usage: Usage,
}

impl MessageResponse {
    fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.content
            .iter()
            .filter(move |block| block.get("type").and_then(Value::as_str) == Some(kind))
    }

    fn joined(&self, kind: &str, field: &str) -> String {
        self.blocks_of(kind)
            .filter_map(|block| block.get(field).and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of all text blocks, joined with newlines.
    pub fn text(&self) -> String {
        self.joined("text", "text")
    }

    /// Text of all thinking blocks, or `None` if there are none.
    pub fn thinking(&self) -> Option<String> {
        self.has_thinking().then(|| self.joined("thinking", "thinking"))
    }

    /// The `text` blocks.
    pub fn text_blocks(&self) -> Vec<&Value> {
        self.blocks_of("text").collect()
    }

    /// The `thinking` blocks.
    pub fn thinking_blocks(&self) -> Vec<&Value> {
        self.blocks_of("thinking").collect()
    }

    /// The `tool_use` blocks.
    pub fn tool_use_blocks(&self) -> Vec<&Value> {
        self.blocks_of("tool_use").collect()
    }

    /// Tool calls, or `None` if the model made none.
    pub fn tool_calls(&self) -> Option<Vec<&Value>> {
        let calls = self.tool_use_blocks();
        (!calls.is_empty()).then_some(calls)
    }

    /// Whether the model asked for a tool call.
    pub fn has_tool_use(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use") || self.blocks_of("tool_use").next().is_some()
    }

    /// Whether the message contains thinking output.
    pub fn has_thinking(&self) -> bool {
        self.blocks_of("thinking").next().is_some()
    }

    /// Citations attached to text blocks, in order.
    pub fn citations(&self) -> Vec<&Value> {
        self.blocks_of("text")
            .filter_map(|block| block.get("citations").and_then(Value::as_array))
            .flatten()
            .collect()
    }

    /// Whether the model declined to answer.
    pub fn is_refusal(&self) -> bool {
        self.stop_reason.as_deref() == Some("refusal")
    }

    /// Whether generation hit `max_tokens`.
    pub fn is_truncated(&self) -> bool {
        self.stop_reason.as_deref() == Some("max_tokens")
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub input_tokens: u64,
    /// Tokens generated.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub output_tokens: u64,
    /// Tokens written to the prompt cache.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cache_creation_input_tokens: u64,
    /// Tokens read from the prompt cache.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cache_read_input_tokens: u64,
}

/// The API sends `null` for counts that do not apply.
fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

impl Usage {
    /// Input plus output tokens.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Whether the prompt cache was read or written.
    pub fn used_cache(&self) -> bool {
        self.cache_read_input_tokens > 0 || self.cache_creation_input_tokens > 0
    }

    /// Apply the cumulative counts of a `message_delta` event.
    pub fn merge(&mut self, delta: &DeltaUsage) {
        if let Some(n) = delta.input_tokens {
            self.input_tokens = n;
        }
        if let Some(n) = delta.output_tokens {
            self.output_tokens = n;
        }
        if let Some(n) = delta.cache_creation_input_tokens {
            self.cache_creation_input_tokens = n;
        }
        if let Some(n) = delta.cache_read_input_tokens {
            self.cache_read_input_tokens = n;
        }
    }
}

/// Response of the token counting endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCountResponse {
    /// Tokens the request would consume as input.
    pub input_tokens: u64,
}

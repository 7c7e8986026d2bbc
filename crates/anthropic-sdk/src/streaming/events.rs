//! Typed view of the Messages API stream events.

use crate::error::{Error, Result};
use crate::response::Usage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event of a Messages API stream.
///
/// Event types this crate does not know are kept as [`StreamEvent::Unknown`]
/// so that new server-side events never break a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// First event; carries the message shell and initial usage.
    MessageStart {
        /// The message with empty content.
        message: StartedMessage,
    },
    /// A new content block begins.
    ContentBlockStart {
        /// Position of the block in the message content.
        index: usize,
        /// The initial block, e.g. `{"type":"text","text":""}`.
        content_block: Value,
    },
    /// An incremental update to a content block.
    ContentBlockDelta {
        /// Position of the block being updated.
        index: usize,
        /// The update.
        delta: ContentDelta,
    },
    /// A content block is complete.
    ContentBlockStop {
        /// Position of the finished block.
        index: usize,
    },
    /// Top-level message changes, sent near the end of the stream.
    MessageDelta {
        /// Stop reason and sequence.
        delta: MessageDeltaBody,
        /// Cumulative output usage.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<DeltaUsage>,
    },
    /// Final event of a message.
    MessageStop,
    /// Keep-alive.
    Ping,
    /// Any event type not listed above.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Convert a raw decoded event.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::parse_error(format!("Unexpected stream event shape: {e}")))
    }

    /// The text fragment, if this is a `text_delta`.
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            Self::ContentBlockDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            } => Some(text),
            _ => None,
        }
    }

    /// The thinking fragment, if this is a `thinking_delta`.
    pub fn thinking_delta(&self) -> Option<&str> {
        match self {
            Self::ContentBlockDelta {
                delta: ContentDelta::ThinkingDelta { thinking },
                ..
            } => Some(thinking),
            _ => None,
        }
    }

    /// Whether this event ends the message.
    pub fn is_message_stop(&self) -> bool {
        matches!(self, Self::MessageStop)
    }
}

/// The message shell carried by `message_start`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartedMessage {
    /// Message identifier.
    #[serde(default)]
    pub id: String,
    /// Model that is generating the message.
    #[serde(default)]
    pub model: String,
    /// Always `assistant` for generated messages.
    #[serde(default)]
    pub role: String,
    /// Content present at start, usually empty.
    #[serde(default)]
    pub content: Vec<Value>,
    /// Stop reason, if already known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Input usage and initial output usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Payload of a `content_block_delta` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    /// Text appended to a text block.
    TextDelta {
        /// Fragment.
        text: String,
    },
    /// Text appended to a thinking block.
    ThinkingDelta {
        /// Fragment.
        thinking: String,
    },
    /// Signature of a finished thinking block.
    SignatureDelta {
        /// Opaque signature.
        signature: String,
    },
    /// A piece of a tool-use input object, as raw JSON text.
    InputJsonDelta {
        /// Fragment; only the concatenation of all fragments is valid JSON.
        partial_json: String,
    },
    /// A citation attached to a text block.
    CitationsDelta {
        /// The citation object.
        citation: Value,
    },
    /// Any delta type not listed above.
    #[serde(other)]
    Unknown,
}

/// Body of a `message_delta` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDeltaBody {
    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// The stop sequence that was hit, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
}

/// Usage reported by `message_delta`; fields are cumulative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaUsage {
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

//! Folding stream events back into a complete message.

use super::events::{ContentDelta, StreamEvent};
use crate::error::{Error, Result};
use crate::response::Usage;
use serde_json::Value;
use std::collections::BTreeMap;

/// A content block rebuilt from stream events.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamedBlock {
    /// Generated text.
    Text {
        /// Concatenated text deltas.
        text: String,
        /// Citations attached while streaming.
        citations: Vec<Value>,
    },
    /// Extended thinking output.
    Thinking {
        /// Concatenated thinking deltas.
        thinking: String,
        /// Signature sent after the thinking text.
        signature: Option<String>,
    },
    /// A tool call.
    ToolUse {
        /// Tool call identifier.
        id: String,
        /// Tool name.
        name: String,
        /// Input object reassembled from `input_json_delta` fragments.
        input: Value,
    },
    /// Any other block, kept as sent in `content_block_start`.
    Other(Value),
}

/// The result of accumulating a whole stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamedMessage {
    /// Message identifier.
    pub id: String,
    /// Model that produced the message.
    pub model: String,
    /// Message role.
    pub role: String,
    /// Content blocks in index order.
    pub content: Vec<StreamedBlock>,
    /// Why generation stopped.
    pub stop_reason: Option<String>,
    /// The stop sequence that was hit.
    pub stop_sequence: Option<String>,
    /// Final token usage.
    pub usage: Usage,
    /// Number of events consumed.
    pub event_count: usize,
}

impl StreamedMessage {
    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                StreamedBlock::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All thinking blocks joined with newlines.
    pub fn thinking(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                StreamedBlock::Thinking { thinking, .. } => Some(thinking.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool calls in the message.
    pub fn tool_uses(&self) -> impl Iterator<Item = &StreamedBlock> {
        self.content
            .iter()
            .filter(|block| matches!(block, StreamedBlock::ToolUse { .. }))
    }
}

#[derive(Debug)]
enum Partial {
    Text { text: String, citations: Vec<Value> },
    Thinking { thinking: String, signature: Option<String> },
    ToolUse { id: String, name: String, json: String },
    Other(Value),
}

impl Partial {
    fn start(block: &Value) -> Self {
        let field = |name: &str| {
            block
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        match block.get("type").and_then(Value::as_str) {
            Some("text") => Self::Text {
                text: field("text"),
                citations: Vec::new(),
            },
            Some("thinking") => Self::Thinking {
                thinking: field("thinking"),
                signature: None,
            },
            Some("tool_use") => Self::ToolUse {
                id: field("id"),
                name: field("name"),
                json: String::new(),
            },
            _ => Self::Other(block.clone()),
        }
    }

    fn apply(&mut self, delta: &ContentDelta) {
        match (self, delta) {
            (Self::Text { text, .. }, ContentDelta::TextDelta { text: more }) => {
                text.push_str(more);
            }
            (Self::Text { citations, .. }, ContentDelta::CitationsDelta { citation }) => {
                citations.push(citation.clone());
            }
            (Self::Thinking { thinking, .. }, ContentDelta::ThinkingDelta { thinking: more }) => {
                thinking.push_str(more);
            }
            (Self::Thinking { signature, .. }, ContentDelta::SignatureDelta { signature: sig }) => {
                *signature = Some(sig.clone());
            }
            (Self::ToolUse { json, .. }, ContentDelta::InputJsonDelta { partial_json }) => {
                json.push_str(partial_json);
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<StreamedBlock> {
        Ok(match self {
            Self::Text { text, citations } => StreamedBlock::Text { text, citations },
            Self::Thinking {
                thinking,
                signature,
            } => StreamedBlock::Thinking {
                thinking,
                signature,
            },
            Self::ToolUse { id, name, json } => {
                let input = if json.trim().is_empty() {
                    Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(&json).map_err(|e| {
                        Error::parse_error(format!("Invalid input JSON for tool '{name}': {e}"))
                    })?
                };
                StreamedBlock::ToolUse { id, name, input }
            }
            Self::Other(value) => StreamedBlock::Other(value),
        })
    }
}

/// Rebuilds a message from its stream events.
///
/// Deltas for a block index that was never started create a text or thinking
/// block on the fly, so a stream joined midway still produces its text.
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    message: StreamedMessage,
    blocks: BTreeMap<usize, Partial>,
}

impl MessageAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the message.
    pub fn push(&mut self, event: &StreamEvent) {
        self.message.event_count += 1;

        match event {
            StreamEvent::MessageStart { message } => {
                self.message.id.clone_from(&message.id);
                self.message.model.clone_from(&message.model);
                self.message.role.clone_from(&message.role);
                if let Some(usage) = &message.usage {
                    self.message.usage = usage.clone();
                }
                if message.stop_reason.is_some() {
                    self.message.stop_reason.clone_from(&message.stop_reason);
                }
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                self.blocks.insert(*index, Partial::start(content_block));
            }
            StreamEvent::ContentBlockDelta { index, delta } => {
                let block = self.blocks.entry(*index).or_insert_with(|| match delta {
                    ContentDelta::ThinkingDelta { .. } | ContentDelta::SignatureDelta { .. } => {
                        Partial::Thinking {
                            thinking: String::new(),
                            signature: None,
                        }
                    }
                    _ => Partial::Text {
                        text: String::new(),
                        citations: Vec::new(),
                    },
                });
                block.apply(delta);
            }
            StreamEvent::MessageDelta { delta, usage } => {
                if delta.stop_reason.is_some() {
                    self.message.stop_reason.clone_from(&delta.stop_reason);
                }
                if delta.stop_sequence.is_some() {
                    self.message.stop_sequence.clone_from(&delta.stop_sequence);
                }
                if let Some(usage) = usage {
                    self.message.usage.merge(usage);
                }
            }
            StreamEvent::ContentBlockStop { .. }
            | StreamEvent::MessageStop
            | StreamEvent::Ping
            | StreamEvent::Unknown => {}
        }
    }

    /// Text accumulated so far across all text blocks.
    pub fn text(&self) -> String {
        self.blocks
            .values()
            .filter_map(|block| match block {
                Partial::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Finish accumulation.
    ///
    /// Fails if a tool call's input fragments do not form valid JSON.
    pub fn into_message(self) -> Result<StreamedMessage> {
        let mut message = self.message;
        message.content = self
            .blocks
            .into_values()
            .map(Partial::finish)
            .collect::<Result<_>>()?;
        Ok(message)
    }
}

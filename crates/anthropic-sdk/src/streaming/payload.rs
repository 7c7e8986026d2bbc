//! Decoding of frame payloads.

use crate::error::{Error, Result};
use serde_json::Value;

/// Payload that marks the normal end of a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A decoded frame payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The `[DONE]` sentinel.
    Done,
    /// A JSON document.
    Value(Value),
}

/// Decode the joined data of one frame.
///
/// Anything other than the sentinel must be strict JSON; a parse failure is
/// reported as [`Error::StreamDecode`] carrying the offending text.
pub fn decode(data: &str) -> Result<Payload> {
    if data == DONE_SENTINEL {
        return Ok(Payload::Done);
    }

    serde_json::from_str(data)
        .map(Payload::Value)
        .map_err(|e| Error::stream_decode(e.to_string(), data))
}

//! The event state machine shared by the blocking and async stream drivers.
//!
//! [`EventParser`] does no I/O. A driver feeds it bytes, tells it when the
//! source is exhausted, and asks it for the next step. Every decoded event
//! passes through [`EventParser::next_step`], which is where stream errors are
//! detected and the terminal states are entered.

use super::frame::FrameAssembler;
use super::line_buffer::LineBuffer;
use super::payload::{self, Payload};
use crate::error::{Error, Result};
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Lifecycle of a single stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Events may still be produced.
    Active,
    /// The stream ended normally, by sentinel or by exhaustion of the source.
    Done,
    /// The stream was aborted by a decode, API or connection error.
    Errored,
}

impl StreamState {
    /// Whether the stream can produce no further events.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Outcome of one [`EventParser::next_step`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A decoded event, in wire order.
    Event(Value),
    /// The buffered bytes hold no complete frame; feed more input.
    NeedInput,
    /// No further events will be produced.
    End,
}

/// Incremental decoder from SSE bytes to JSON events.
#[derive(Debug)]
pub struct EventParser {
    lines: LineBuffer,
    frames: FrameAssembler,
    state: StreamState,
    events: usize,
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventParser {
    /// Create a parser in the [`StreamState::Active`] state.
    pub fn new() -> Self {
        Self {
            lines: LineBuffer::new(),
            frames: FrameAssembler::new(),
            state: StreamState::Active,
            events: 0,
        }
    }

    /// Current stream state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Number of events yielded so far.
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// Feed bytes read from the source. Ignored once the stream is terminal.
    pub fn feed(&mut self, bytes: &[u8]) {
        if self.state == StreamState::Active && !self.lines.is_finished() {
            self.lines.append(bytes);
        }
    }

    /// Signal that the source has no more bytes.
    pub fn finish(&mut self) {
        self.lines.finish();
    }

    /// Abort the stream with `error`, e.g. when the byte source fails.
    ///
    /// Returns the error so the driver can hand it to the caller.
    pub fn fail(&mut self, error: Error) -> Error {
        warn!(error = %error, events = self.events, "stream aborted");
        self.state = StreamState::Errored;
        error
    }

    /// Advance until an event is decoded, more input is needed, or the
    /// stream ends.
    ///
    /// An error is returned at most once; afterwards the parser reports
    /// [`Step::End`].
    pub fn next_step(&mut self) -> Result<Step> {
        if self.state.is_terminal() {
            return Ok(Step::End);
        }

        loop {
            let Some(line) = self.lines.next_line() else {
                if self.lines.is_finished() {
                    self.end_of_source();
                    return Ok(Step::End);
                }
                return Ok(Step::NeedInput);
            };

            let line = match std::str::from_utf8(&line) {
                Ok(line) => line,
                Err(e) => {
                    let raw = String::from_utf8_lossy(&line).into_owned();
                    return Err(self.fail(Error::stream_decode(
                        format!("invalid UTF-8 in stream: {e}"),
                        raw,
                    )));
                }
            };

            let Some(frame) = self.frames.feed(line) else {
                continue;
            };

            let data = frame.payload();
            trace!(
                event = frame.event.as_deref().unwrap_or("message"),
                bytes = data.len(),
                "stream frame"
            );

            match payload::decode(&data) {
                Ok(Payload::Done) => {
                    debug!(events = self.events, "stream finished by sentinel");
                    self.state = StreamState::Done;
                    return Ok(Step::End);
                }
                Ok(Payload::Value(value)) => {
                    if event_type(&value) == Some("error") {
                        return Err(self.fail(api_error(&value, data)));
                    }
                    self.events += 1;
                    return Ok(Step::Event(value));
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
    }

    fn end_of_source(&mut self) {
        if let Some(partial) = self.frames.discard() {
            debug!(
                data_lines = partial.data.len(),
                "dropping unterminated frame at end of stream"
            );
        }
        debug!(events = self.events, "stream source exhausted");
        self.state = StreamState::Done;
    }
}

/// The `type` discriminator of a decoded event.
pub fn event_type(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn api_error(value: &Value, raw: String) -> Error {
    let detail = value.get("error");
    let message = detail
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("unknown error reported by the API")
        .to_owned();
    let error_type = detail
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Error::stream_api(error_type, message, raw)
}

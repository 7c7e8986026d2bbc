//! Server-sent event decoding for the Messages API.
//!
//! Bytes are split into lines, lines are assembled into frames, and each
//! frame's payload is decoded as JSON. [`EventParser`] holds that pipeline
//! without doing any I/O; [`EventDecoder`] drives it from a blocking
//! [`std::io::Read`] and [`MessageStream`] from an async byte stream.

mod accumulator;
mod decoder;
mod events;
mod frame;
mod line_buffer;
mod parser;
mod payload;
mod stream;

pub use accumulator::{MessageAccumulator, StreamedBlock, StreamedMessage};
pub use decoder::EventDecoder;
pub use events::{ContentDelta, DeltaUsage, MessageDeltaBody, StartedMessage, StreamEvent};
pub use frame::{Frame, FrameAssembler};
pub use line_buffer::LineBuffer;
pub use parser::{event_type, EventParser, Step, StreamState};
pub use payload::{decode as decode_payload, Payload, DONE_SENTINEL};
pub use stream::MessageStream;

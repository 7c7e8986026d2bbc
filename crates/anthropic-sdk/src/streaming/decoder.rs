//! Blocking event iterator over any [`std::io::Read`] byte source.

use super::accumulator::{MessageAccumulator, StreamedMessage};
use super::events::StreamEvent;
use super::parser::{EventParser, Step, StreamState};
use crate::error::{Error, Result};
use serde_json::Value;
use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;

/// Pull-based decoder that turns a blocking byte source into events.
///
/// Each call to [`Iterator::next`] reads from the source only until one event
/// is complete. Reading blocks the calling thread; bound it with a read
/// timeout on the source if needed.
///
/// The iterator yields `Ok(event)` for every JSON payload, ends on `[DONE]`
/// or end of input, and yields a single `Err` followed by `None` on a
/// malformed payload, an in-stream API error, or a read failure.
///
/// ```
/// use anthropic_sdk::EventDecoder;
///
/// let body = "event: ping\ndata: {\"type\":\"ping\"}\n\ndata: [DONE]\n\n";
/// let events: Vec<_> = EventDecoder::new(body.as_bytes())
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug)]
pub struct EventDecoder<R> {
    source: R,
    parser: EventParser,
    buf: Box<[u8]>,
}

impl<R: Read> EventDecoder<R> {
    /// Default number of bytes requested per read.
    pub const DEFAULT_READ_SIZE: usize = 8 * 1024;

    /// Create a decoder over `source`.
    ///
    /// Pass `&mut reader` to keep ownership of the source.
    pub fn new(source: R) -> Self {
        Self::with_read_size(source, Self::DEFAULT_READ_SIZE)
    }

    /// Create a decoder that requests at most `read_size` bytes per read.
    pub fn with_read_size(source: R, read_size: usize) -> Self {
        Self {
            source,
            parser: EventParser::new(),
            buf: vec![0; read_size.max(1)].into_boxed_slice(),
        }
    }

    /// Current stream state.
    pub fn state(&self) -> StreamState {
        self.parser.state()
    }

    /// Give back the byte source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// View the stream as typed [`StreamEvent`]s.
    pub fn typed(self) -> impl Iterator<Item = Result<StreamEvent>> {
        self.map(|item| item.and_then(StreamEvent::from_value))
    }

    /// Drain the stream and concatenate every text delta.
    pub fn collect_text(self) -> Result<String> {
        let mut text = String::new();
        for event in self.typed() {
            if let Some(delta) = event?.text_delta() {
                text.push_str(delta);
            }
        }
        Ok(text)
    }

    /// Drain the stream into a complete message.
    pub fn accumulate(self) -> Result<StreamedMessage> {
        let mut accumulator = MessageAccumulator::new();
        for event in self.typed() {
            accumulator.push(&event?);
        }
        accumulator.into_message()
    }
}

impl<R: Read> Iterator for EventDecoder<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.parser.next_step() {
                Ok(Step::Event(value)) => return Some(Ok(value)),
                Ok(Step::End) => return None,
                Ok(Step::NeedInput) => {}
                Err(e) => return Some(Err(e)),
            }

            match self.source.read(&mut self.buf) {
                Ok(0) => self.parser.finish(),
                Ok(n) => self.parser.feed(&self.buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    let error = Error::connection(format!("failed to read stream: {e}"));
                    return Some(Err(self.parser.fail(error)));
                }
            }
        }
    }
}

impl<R: Read> FusedIterator for EventDecoder<R> {}

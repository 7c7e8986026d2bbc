//! Async event stream over a chunked byte stream.

use super::accumulator::{MessageAccumulator, StreamedMessage};
use super::events::StreamEvent;
use super::parser::{EventParser, Step, StreamState};
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use pin_project_lite::pin_project;
use serde_json::Value;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

pin_project! {
    /// A stream of Messages API events.
    ///
    /// Yields each decoded event as a JSON value, in wire order. The stream
    /// ends after `[DONE]` or when the body ends, and yields at most one error,
    /// after which it returns `None`.
    ///
    /// Dropping the stream releases the underlying connection.
    pub struct MessageStream {
        #[pin]
        inner: ByteStream,
        parser: EventParser,
    }
}

impl MessageStream {
    /// Create a stream over any chunked byte source.
    ///
    /// Errors from the source abort the stream as [`Error::Connection`].
    pub fn new<S, B, E>(source: S) -> Self
    where
        S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
        B: Into<Bytes> + 'static,
        E: Display + 'static,
    {
        let inner = source.map(|chunk| {
            chunk
                .map(Into::into)
                .map_err(|e| Error::connection(format!("Stream interrupted: {e}")))
        });
        Self {
            inner: Box::pin(inner),
            parser: EventParser::new(),
        }
    }

    /// Stream the body of an HTTP response.
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream())
    }

    /// Current stream state.
    pub fn state(&self) -> StreamState {
        self.parser.state()
    }

    /// View the stream as typed [`StreamEvent`]s.
    pub fn typed(self) -> impl Stream<Item = Result<StreamEvent>> + Send {
        self.map(|item| item.and_then(StreamEvent::from_value))
    }

    /// Only the text fragments of `text_delta` events.
    pub fn text_stream(self) -> impl Stream<Item = Result<String>> + Send {
        async_stream::try_stream! {
            let mut events = std::pin::pin!(self.typed());
            while let Some(event) = events.next().await {
                if let Some(text) = event?.text_delta() {
                    yield text.to_owned();
                }
            }
        }
    }

    /// Drain the stream and concatenate every text delta.
    pub async fn collect_text(self) -> Result<String> {
        let mut events = std::pin::pin!(self.typed());
        let mut text = String::new();
        while let Some(event) = events.next().await {
            if let Some(delta) = event?.text_delta() {
                text.push_str(delta);
            }
        }
        Ok(text)
    }

    /// Drain the stream into a complete message.
    pub async fn accumulate(self) -> Result<StreamedMessage> {
        let mut events = std::pin::pin!(self.typed());
        let mut accumulator = MessageAccumulator::new();
        while let Some(event) = events.next().await {
            accumulator.push(&event?);
        }
        accumulator.into_message()
    }
}

impl Stream for MessageStream {
    type Item = Result<Value>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            match this.parser.next_step() {
                Ok(Step::Event(value)) => return Poll::Ready(Some(Ok(value))),
                Ok(Step::End) => return Poll::Ready(None),
                Ok(Step::NeedInput) => {}
                Err(e) => return Poll::Ready(Some(Err(e))),
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => this.parser.feed(&bytes),
                Some(Err(e)) => return Poll::Ready(Some(Err(this.parser.fail(e)))),
                None => this.parser.finish(),
            }
        }
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

//! # Anthropic SDK
//!
//! A Rust client for the Anthropic Messages API.
//!
//! ## Features
//!
//! - Incremental server-sent event decoding that works on any chunking of
//!   the response body, blocking ([`EventDecoder`]) or async ([`MessageStream`])
//! - Typed stream events and a [`MessageAccumulator`] that rebuilds the
//!   final message, including tool input sent as JSON fragments
//! - Request builders that validate before anything is sent
//! - Token counting and the Message Batches API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anthropic_sdk::{Client, Models};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), anthropic_sdk::Error> {
//!     let client = Client::from_env()?;
//!
//!     let response = client
//!         .messages()
//!         .model(Models::recommended())
//!         .max_tokens(1024)
//!         .user("Hello, Claude")
//!         .create()
//!         .await?;
//!
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use anthropic_sdk::{Client, Models, StreamEvent};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), anthropic_sdk::Error> {
//!     let client = Client::from_env()?;
//!
//!     let stream = client
//!         .messages()
//!         .model(Models::fast())
//!         .max_tokens(512)
//!         .user("Tell me a story")
//!         .stream()
//!         .await?;
//!
//!     let mut events = std::pin::pin!(stream.typed());
//!     while let Some(event) = events.next().await {
//!         if let Some(text) = event?.text_delta() {
//!             print!("{text}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Decoding a captured stream
//!
//! ```
//! use anthropic_sdk::EventDecoder;
//!
//! let body = concat!(
//!     "event: content_block_delta\n",
//!     "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n",
//!     "\n",
//!     "data: [DONE]\n",
//!     "\n",
//! );
//! let text = EventDecoder::new(body.as_bytes()).collect_text().unwrap();
//! assert_eq!(text, "Hi");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod batches;
mod client;
mod config;
mod content;
mod error;
mod models;
mod request;
mod response;
pub mod streaming;
mod tools;

pub use batches::{
    parse_jsonl, Batch, BatchList, BatchOutcome, BatchRequest, BatchResult, Batches, ListOptions,
    ProcessingStatus, RequestCounts,
};
pub use client::{Client, ClientBuilder, MessagesBuilder};
pub use config::{ClientConfig, API_KEY_ENV, BASE_URL_ENV, VERSION_ENV};
pub use content::{
    CacheControl, Citations, ContentBlock, MediaSource, Message, Role, DEFAULT_CACHE_TTL,
    IMAGE_MEDIA_TYPES,
};
pub use error::{ApiErrorDetail, ApiErrorResponse, Error, Result};
pub use models::Models;
pub use request::{
    CountTokensRequest, MessagesRequest, MessagesRequestBuilder, ServiceTier, SystemPrompt,
    ThinkingConfig, MIN_THINKING_BUDGET,
};
pub use response::{MessageResponse, TokenCountResponse, Usage};
pub use streaming::{
    ContentDelta, EventDecoder, EventParser, MessageAccumulator, MessageStream, StreamEvent,
    StreamState, StreamedBlock, StreamedMessage,
};
pub use tools::{Tool, ToolChoice, UserLocation, WebSearchTool};

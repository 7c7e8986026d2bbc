//! Stream decoding behaviour over both the blocking and async drivers.

use anthropic_sdk::{
    ContentDelta, Error, EventDecoder, MessageStream, StreamEvent, StreamState,
};
use bytes::Bytes;
use futures::{stream, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::{self, Read};

const TWO_DELTAS: &str = concat!(
    "event: message_start\n",
    "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"role\":\"assistant\",\"model\":\"claude-sonnet-4-5-latest\",\"content\":[],\"usage\":{\"input_tokens\":9,\"output_tokens\":1}}}\n",
    "\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n",
    "\n",
    ": keep-alive\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" world\"}}\n",
    "\n",
    "event: message_delta\n",
    "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":3}}\n",
    "\n",
    "data: [DONE]\n",
    "\n",
    "data: {\"type\":\"ping\"}\n",
    "\n",
);

/// Reader that returns at most `chunk` bytes per call.
struct Chunked<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for Chunked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// Reader that yields `data` and then fails.
struct FailingAfter<'a> {
    data: &'a [u8],
}

impl Read for FailingAfter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::ConnectionAborted, "peer went away"));
        }
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn decode_all(body: &str) -> Vec<Result<Value, Error>> {
    EventDecoder::new(body.as_bytes()).collect()
}

fn decode_chunked(body: &str, chunk: usize) -> Vec<Value> {
    EventDecoder::new(Chunked {
        data: body.as_bytes(),
        chunk,
    })
    .collect::<Result<_, _>>()
    .unwrap()
}

fn async_stream_of(body: &'static str, chunk: usize) -> MessageStream {
    let pieces: Vec<Result<Bytes, io::Error>> = body
        .as_bytes()
        .chunks(chunk)
        .map(|piece| Ok(Bytes::copy_from_slice(piece)))
        .collect();
    MessageStream::new(stream::iter(pieces))
}

#[test]
fn test_two_deltas_then_done() {
    let events: Vec<Value> = decode_all(TWO_DELTAS)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let types: Vec<&str> = events
        .iter()
        .filter_map(|e| e["type"].as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "message_start",
            "content_block_delta",
            "content_block_delta",
            "message_delta"
        ]
    );
    assert_eq!(events[1]["delta"]["text"], "Hello");
    assert_eq!(events[2]["delta"]["text"], " world");
}

#[test]
fn test_rechunking_does_not_change_events() {
    let expected = decode_chunked(TWO_DELTAS, TWO_DELTAS.len());
    for chunk in 1..64 {
        assert_eq!(decode_chunked(TWO_DELTAS, chunk), expected, "chunk size {chunk}");
    }
}

#[tokio::test]
async fn test_async_rechunking_matches_blocking() {
    let expected = decode_chunked(TWO_DELTAS, 4096);
    for chunk in [1, 2, 3, 7, 16, 100, 4096] {
        let events: Vec<Value> = async_stream_of(TWO_DELTAS, chunk)
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(events, expected, "chunk size {chunk}");
    }
}

#[test]
fn test_collect_text_and_accumulate() {
    assert_eq!(
        EventDecoder::new(TWO_DELTAS.as_bytes()).collect_text().unwrap(),
        "Hello world"
    );

    let message = EventDecoder::new(TWO_DELTAS.as_bytes()).accumulate().unwrap();
    assert_eq!(message.id, "msg_1");
    assert_eq!(message.text(), "Hello world");
    assert_eq!(message.stop_reason.as_deref(), Some("end_turn"));
    assert_eq!(message.usage.input_tokens, 9);
    assert_eq!(message.usage.output_tokens, 3);
}

#[test]
fn test_error_event_raised_once() {
    let body = concat!(
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
        "event: error\n",
        "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Service temporarily overloaded\"}}\n\n",
        "data: {\"type\":\"ping\"}\n\n",
    );

    let mut decoder = EventDecoder::new(body.as_bytes());
    assert!(decoder.next().unwrap().is_ok());

    let err = decoder.next().unwrap().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Stream error (overloaded_error): Service temporarily overloaded"
    );
    assert!(err.is_stream_error());
    assert!(err.is_retryable());
    assert!(err.raw_payload().unwrap().contains("overloaded_error"));

    assert!(decoder.next().is_none());
    assert!(decoder.next().is_none());
    assert_eq!(decoder.state(), StreamState::Errored);
}

#[test]
fn test_malformed_json_aborts() {
    let items = decode_all("data: {\"type\": oops}\n\ndata: {\"type\":\"ping\"}\n\n");
    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(Error::StreamDecode { raw, .. }) => assert_eq!(raw, "{\"type\": oops}"),
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn test_non_data_lines_are_skipped() {
    let body = concat!(
        "event: message_start\n",
        "\n",
        "id: 7\n",
        "retry: 3000\n",
        ": comment\n",
        "data: {\"type\":\"ping\"}\n",
        "\n",
        "data: {\"type\":\"message_stop\"}\n",
        "\n",
    );

    let events: Vec<Value> = decode_all(body).into_iter().map(Result::unwrap).collect();
    assert_eq!(events, vec![json!({"type": "ping"}), json!({"type": "message_stop"})]);
}

#[test]
fn test_multi_line_data_is_joined() {
    let body = "data: {\"type\":\"content_block_delta\",\ndata: \"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"x\"}}\n\n";
    let events: Vec<Value> = decode_all(body).into_iter().map(Result::unwrap).collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["delta"]["text"], "x");
}

#[test]
fn test_crlf_line_endings() {
    let body = TWO_DELTAS.replace('\n', "\r\n");
    assert_eq!(
        EventDecoder::new(body.as_bytes()).collect_text().unwrap(),
        "Hello world"
    );
}

#[test]
fn test_end_without_sentinel() {
    let body = "data: {\"type\":\"message_stop\"}\n\n";
    let mut decoder = EventDecoder::new(body.as_bytes());
    assert!(decoder.next().unwrap().is_ok());
    assert!(decoder.next().is_none());
    assert_eq!(decoder.state(), StreamState::Done);
}

#[test]
fn test_truncated_final_frame_is_dropped() {
    let body = "data: {\"type\":\"ping\"}\n\ndata: {\"type\":\"message_stop\"}\n";
    let events: Vec<Value> = decode_all(body).into_iter().map(Result::unwrap).collect();
    assert_eq!(events, vec![json!({"type": "ping"})]);
}

#[test]
fn test_empty_body() {
    assert!(decode_all("").is_empty());
}

#[test]
fn test_abandon_after_first_event() {
    let mut source = TWO_DELTAS.as_bytes();
    {
        let mut decoder = EventDecoder::with_read_size(&mut source, 16);
        let first = decoder.next().unwrap().unwrap();
        assert_eq!(first["type"], "message_start");
    }
    // Only what was needed for the first event has been read.
    assert!(!source.is_empty());
}

#[test]
fn test_read_failure_surfaces_as_connection_error() {
    let body = "data: {\"type\":\"ping\"}\n\ndata: {\"type\":\"pi";
    let items: Vec<_> = EventDecoder::new(FailingAfter {
        data: body.as_bytes(),
    })
    .collect();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(Error::Connection { .. })));
}

#[test]
fn test_typed_events() {
    let body = concat!(
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"get_weather\",\"input\":{}}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"city\\\":\"}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"\\\"Paris\\\"}\"}}\n\n",
        "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );

    let events: Vec<StreamEvent> = EventDecoder::new(body.as_bytes())
        .typed()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(matches!(
        &events[1],
        StreamEvent::ContentBlockDelta {
            delta: ContentDelta::InputJsonDelta { partial_json },
            ..
        } if partial_json == "{\"city\":"
    ));
    assert!(events[4].is_message_stop());

    let message = EventDecoder::new(body.as_bytes()).accumulate().unwrap();
    let tool = message.tool_uses().next().cloned();
    assert_eq!(
        tool,
        Some(anthropic_sdk::StreamedBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: "get_weather".to_string(),
            input: json!({"city": "Paris"}),
        })
    );
}

#[tokio::test]
async fn test_async_error_then_end() {
    let body = "data: {\"type\":\"error\",\"error\":{\"type\":\"api_error\",\"message\":\"boom\"}}\n\n";
    let mut stream = async_stream_of(body, 5);

    match stream.next().await {
        Some(Err(Error::StreamApi { error_type, message, .. })) => {
            assert_eq!(error_type.as_deref(), Some("api_error"));
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(stream.next().await.is_none());
    assert_eq!(stream.state(), StreamState::Errored);
}

#[tokio::test]
async fn test_async_accumulate_thinking() {
    let body = concat!(
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"thinking\",\"thinking\":\"\"}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"thinking_delta\",\"thinking\":\"Let me think...\"}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"signature_delta\",\"signature\":\"EqQBCgIYAh\"}}\n\n",
        "data: {\"type\":\"content_block_start\",\"index\":1,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"text_delta\",\"text\":\"42\"}}\n\n",
        "data: [DONE]\n\n",
    );

    let message = async_stream_of(body, 11).accumulate().await.unwrap();
    assert_eq!(message.thinking(), "Let me think...");
    assert_eq!(message.text(), "42");
}

#[test]
fn test_error_as_first_payload() {
    let body = "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Service temporarily overloaded\"}}\n\n";
    let items = decode_all(body);

    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(Error::StreamApi { message, .. }) => {
            assert_eq!(message, "Service temporarily overloaded")
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn test_split_json_across_data_lines() {
    let events: Vec<Value> = decode_all("data: {\"a\":\ndata: 1}\n\n")
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(events, vec![json!({"a": 1})]);
}

#[test]
fn test_abandoned_decoder_stays_active() {
    let mut decoder = EventDecoder::new(TWO_DELTAS.as_bytes());
    assert!(decoder.next().unwrap().is_ok());
    assert_eq!(decoder.state(), StreamState::Active);
}

#[tokio::test]
async fn test_null_cache_counts_in_message_start() {
    let body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"role\":\"assistant\",\"model\":\"claude-sonnet-4-5-latest\",\"content\":[],\"usage\":{\"input_tokens\":4,\"output_tokens\":1,\"cache_creation_input_tokens\":null,\"cache_read_input_tokens\":null}}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
        "data: [DONE]\n\n",
    );

    assert_eq!(async_stream_of(body, 13).collect_text().await.unwrap(), "Hi");

    let message = async_stream_of(body, 13).accumulate().await.unwrap();
    assert_eq!(message.usage.input_tokens, 4);
    assert_eq!(message.usage.cache_creation_input_tokens, 0);
    assert_eq!(message.usage.cache_read_input_tokens, 0);
}

#[test]
fn test_bare_deltas_then_done() {
    let body = concat!(
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" world\"}}\n\n",
        "data: [DONE]\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"!\"}}\n\n",
    );

    let mut decoder = EventDecoder::new(body.as_bytes());
    let events: Vec<Value> = decoder.by_ref().map(Result::unwrap).collect();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["delta"]["text"], "Hello");
    assert_eq!(events[1]["delta"]["text"], " world");
    assert_eq!(decoder.state(), StreamState::Done);
}

//! HTTP behaviour of the client against a mock Anthropic API.

use anthropic_sdk::{
    BatchOutcome, BatchRequest, Client, Error, ListOptions, MessagesRequest, ProcessingStatus,
};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "claude-haiku-4-5-latest";

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(format!("{}/v1", server.uri()))
        .api_key("test-key")
        .build()
        .unwrap()
}

fn message_body(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": MODEL,
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": {"input_tokens": 12, "output_tokens": 4}
    })
}

fn batch_body(id: &str, status: &str, results_url: Option<String>) -> serde_json::Value {
    json!({
        "id": id,
        "type": "message_batch",
        "processing_status": status,
        "request_counts": {"processing": 0, "succeeded": 1, "errored": 1},
        "created_at": "2025-06-01T00:00:00Z",
        "results_url": results_url
    })
}

#[tokio::test]
async fn test_create_message_sends_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "max_tokens": 64,
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .messages()
        .model(MODEL)
        .max_tokens(64)
        .user("Hello")
        .create()
        .await
        .unwrap();

    assert_eq!(response.text(), "Hi there");
    assert_eq!(response.usage.total_tokens(), 16);
}

#[tokio::test]
async fn test_beta_flags_are_merged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(format!("{}/v1/", server.uri()))
        .api_key("test-key")
        .beta("files-api-2025-04-14")
        .build()
        .unwrap();

    client
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .user("Hello")
        .beta("context-1m-2025-08-07")
        .beta("files-api-2025-04-14")
        .create()
        .await
        .unwrap();

    // The header matcher splits on commas, so compare the raw value.
    let received = server.received_requests().await.unwrap();
    let betas: Vec<_> = received[0].headers.get_all("anthropic-beta").iter().collect();
    assert_eq!(betas.len(), 1);
    assert_eq!(
        betas[0].to_str().unwrap(),
        "files-api-2025-04-14,context-1m-2025-08-07"
    );
}

#[tokio::test]
async fn test_invalid_request_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .user("Hello")
        .temperature(1.5)
        .create()
        .await
        .unwrap_err();

    match err {
        Error::InvalidRequest { parameter, .. } => {
            assert_eq!(parameter.as_deref(), Some("temperature"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_mapping() {
    let server = MockServer::start().await;
    let error_body = |kind: &str, message: &str| {
        json!({"type": "error", "error": {"type": kind, "message": message}})
    };

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"max_tokens": 1})))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(error_body("authentication_error", "invalid x-api-key")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"max_tokens": 2})))
        .respond_with(
            ResponseTemplate::new(429)
                .append_header("retry-after", "30")
                .append_header("request-id", "req_429")
                .set_body_json(error_body("rate_limit_error", "slow down")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"max_tokens": 3})))
        .respond_with(
            ResponseTemplate::new(529).set_body_json(error_body("overloaded_error", "Overloaded")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"max_tokens": 4})))
        .respond_with(
            ResponseTemplate::new(400)
                .append_header("request-id", "req_400")
                .set_body_json(error_body("invalid_request_error", "messages: field required")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"max_tokens": 5})))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let call = |max_tokens: u32| {
        client
            .messages()
            .model(MODEL)
            .max_tokens(max_tokens)
            .user("Hello")
            .create()
    };

    let err = call(1).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { ref message } if message == "invalid x-api-key"));
    assert!(!err.is_retryable());

    let err = call(2).await.unwrap_err();
    assert_eq!(err.status_code(), Some(429));
    assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
    assert_eq!(err.request_id(), Some("req_429"));
    assert!(err.is_retryable());

    let err = call(3).await.unwrap_err();
    assert!(matches!(err, Error::Unavailable { status: 529, .. }));
    assert!(err.is_retryable());

    let err = call(4).await.unwrap_err();
    match &err {
        Error::Api {
            status,
            message,
            error_type,
            request_id,
        } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "messages: field required");
            assert_eq!(error_type.as_deref(), Some("invalid_request_error"));
            assert_eq!(request_id.as_deref(), Some("req_400"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());

    let err = call(5).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 502, ref message, .. } if message == "Bad Gateway"));
}

#[tokio::test]
async fn test_stream_message_over_http() {
    let server = MockServer::start().await;
    let sse = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_s\",\"role\":\"assistant\",\"model\":\"claude-haiku-4-5-latest\",\"content\":[],\"usage\":{\"input_tokens\":5,\"output_tokens\":1}}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" world\"}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = || {
        client
            .messages()
            .model(MODEL)
            .max_tokens(32)
            .user("Say hello")
    };

    let text = request().stream().await.unwrap().collect_text().await.unwrap();
    assert_eq!(text, "Hello world");

    let events: Vec<_> = request().stream().await.unwrap().typed().collect().await;
    assert_eq!(events.len(), 4);
    assert!(events[3].as_ref().unwrap().is_message_stop());
}

#[tokio::test]
async fn test_stream_rejected_before_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "bad key"}
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .user("Hello")
        .stream()
        .await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_stream_error_event_over_http() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\n",
        "event: error\n",
        "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let mut stream = client_for(&server)
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .user("Hello")
        .stream()
        .await
        .unwrap();

    assert!(stream.next().await.unwrap().is_ok());
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::StreamApi { .. }));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_count_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages/count_tokens"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "system": "Be brief."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"input_tokens": 21})))
        .expect(1)
        .mount(&server)
        .await;

    let count = client_for(&server)
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .system("Be brief.")
        .user("Hello")
        .count_tokens()
        .await
        .unwrap();
    assert_eq!(count.input_tokens, 21);
}

#[tokio::test]
async fn test_count_tokens_omits_max_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages/count_tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"input_tokens": 3})))
        .mount(&server)
        .await;

    client_for(&server)
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .user("Hi")
        .count_tokens()
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("max_tokens").is_none());
    assert!(body.get("stream").is_none());
}

fn batch_request(custom_id: &str) -> BatchRequest {
    BatchRequest::new(
        custom_id,
        MessagesRequest::builder()
            .model(MODEL)
            .max_tokens(16)
            .user("Summarise")
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn test_batch_create_and_cancel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages/batches"))
        .and(body_partial_json(json!({
            "requests": [{"custom_id": "one", "params": {"model": MODEL}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_body(
            "msgbatch_1",
            "in_progress",
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages/batches/msgbatch_1/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_body(
            "msgbatch_1",
            "canceling",
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let batch = client
        .batches()
        .create(&[batch_request("one")])
        .await
        .unwrap();
    assert!(batch.is_processing());

    let batch = client.batches().cancel(&batch.id).await.unwrap();
    assert_eq!(batch.processing_status, ProcessingStatus::Canceling);
}

#[tokio::test]
async fn test_batch_list_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/messages/batches"))
        .and(query_param("after_id", "msgbatch_0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                batch_body("msgbatch_1", "ended", None),
                batch_body("msgbatch_2", "in_progress", None)
            ],
            "has_more": true,
            "first_id": "msgbatch_1",
            "last_id": "msgbatch_2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .batches()
        .list(&ListOptions {
            after_id: Some("msgbatch_0".to_string()),
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert!(page.has_more);
    assert_eq!(page.last_id.as_deref(), Some("msgbatch_2"));
}

#[tokio::test]
async fn test_batch_results_download() {
    let server = MockServer::start().await;
    let results_url = format!("{}/v1/messages/batches/msgbatch_9/results", server.uri());

    Mock::given(method("GET"))
        .and(path("/v1/messages/batches/msgbatch_9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_body(
            "msgbatch_9",
            "ended",
            Some(results_url),
        )))
        .mount(&server)
        .await;

    let jsonl = format!(
        "{}\n{}\n",
        json!({"custom_id": "one", "result": {"type": "succeeded", "message": message_body("done")}}),
        json!({"custom_id": "two", "result": {"type": "errored", "error": {"type": "invalid_request_error", "message": "bad"}}}),
    );
    Mock::given(method("GET"))
        .and(path("/v1/messages/batches/msgbatch_9/results"))
        .and(header_exists("x-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(jsonl, "application/x-jsonl"))
        .expect(1)
        .mount(&server)
        .await;

    let results = client_for(&server)
        .batches()
        .results("msgbatch_9")
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].custom_id, "one");
    match &results[0].result {
        BatchOutcome::Succeeded { message } => assert_eq!(message.text(), "done"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(matches!(results[1].result, BatchOutcome::Errored { .. }));
}

#[tokio::test]
async fn test_batch_results_require_ended_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/messages/batches/msgbatch_busy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_body(
            "msgbatch_busy",
            "in_progress",
            None,
        )))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .batches()
        .results("msgbatch_busy")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not finished processing"));
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = Client::builder()
        .base_url(format!("http://127.0.0.1:{port}/v1"))
        .api_key("test-key")
        .build()
        .unwrap();
    let err = client
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .user("Hello")
        .create()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connection { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_request_timeout_does_not_cut_streams() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"late\"}}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse, "text/event-stream")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(message_body("late"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(format!("{}/v1", server.uri()))
        .api_key("test-key")
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let request = || client.messages().model(MODEL).max_tokens(8).user("Hello");

    let text = request().stream().await.unwrap().collect_text().await.unwrap();
    assert_eq!(text, "late");

    let err = request().create().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { duration_ms: 100 }));
}

#[tokio::test]
async fn test_stream_timeout_bounds_streams() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: [DONE]\n\n", "text/event-stream")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(format!("{}/v1", server.uri()))
        .api_key("test-key")
        .stream_timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let result = client
        .messages()
        .model(MODEL)
        .max_tokens(8)
        .user("Hello")
        .stream()
        .await;

    assert!(matches!(result, Err(Error::Timeout { duration_ms: 100 })));
}

#[tokio::test]
async fn test_batch_id_is_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/messages/batches/a%2Fb%3Fc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_body("a/b?c", "ended", None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages/batches/x%2F..%2Fy/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_body(
            "x/../y",
            "canceling",
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let batch = client.batches().retrieve("a/b?c").await.unwrap();
    assert_eq!(batch.id, "a/b?c");

    let batch = client.batches().cancel("x/../y").await.unwrap();
    assert!(batch.is_canceling());
}

//! Error types for the Anthropic SDK.

use thiserror::Error;

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the Anthropic SDK.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error during client setup.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status before any body was consumed.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the server.
        message: String,
        /// Error type from the server (e.g. `invalid_request_error`).
        error_type: Option<String>,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: retry after {retry_after:?} seconds")]
    RateLimited {
        /// Number of seconds the server asked us to wait.
        retry_after: Option<u64>,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message describing the authentication failure.
        message: String,
    },

    /// Invalid request parameters.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message describing the invalid request.
        message: String,
        /// The parameter that was invalid.
        parameter: Option<String>,
    },

    /// Response parsing failed.
    #[error("Failed to parse response: {message}")]
    ParseError {
        /// Error message describing the parse failure.
        message: String,
    },

    /// A stream frame carried a payload that is not valid JSON.
    #[error("Malformed stream payload: {message}")]
    StreamDecode {
        /// Human-readable description of the failure.
        message: String,
        /// The offending payload text.
        raw: String,
    },

    /// The API reported an error in the middle of a stream.
    #[error("Stream error{}: {message}", type_suffix(.error_type))]
    StreamApi {
        /// Upstream error type (e.g. `overloaded_error`).
        error_type: Option<String>,
        /// Upstream error message.
        message: String,
        /// The raw payload that carried the error.
        raw: String,
    },

    /// Timeout waiting for response.
    #[error("Request timed out after {duration_ms}ms")]
    Timeout {
        /// Duration in milliseconds before timeout.
        duration_ms: u64,
    },

    /// The connection could not be established or broke while reading.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message describing the connection error.
        message: String,
    },

    /// Server unavailable or overloaded.
    #[error("Server unavailable ({status}): {message}")]
    Unavailable {
        /// HTTP status code (503 or 529).
        status: u16,
        /// Error message describing the unavailability.
        message: String,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an API error from response details.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            error_type: None,
            request_id: None,
        }
    }

    /// Create a rate limited error.
    pub fn rate_limited(retry_after: Option<u64>) -> Self {
        Self::RateLimited {
            retry_after,
            request_id: None,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            parameter: None,
        }
    }

    /// Create an invalid request error naming the offending parameter.
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            parameter: Some(parameter.into()),
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a stream decode error for a malformed payload.
    pub fn stream_decode(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::StreamDecode {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Create an in-stream API error.
    pub fn stream_api(
        error_type: Option<String>,
        message: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self::StreamApi {
            error_type,
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(status: u16, message: impl Into<String>) -> Self {
        Self::Unavailable {
            status,
            message: message.into(),
        }
    }

    /// Check if the error was raised while decoding a stream.
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Self::StreamDecode { .. } | Self::StreamApi { .. })
    }

    /// Check if the error is transient.
    ///
    /// The SDK never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } | Self::Unavailable { .. } => true,
            Self::Timeout { .. } | Self::Connection { .. } => true,
            Self::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504 | 529),
            Self::StreamApi { error_type, .. } => {
                matches!(error_type.as_deref(), Some("overloaded_error" | "api_error"))
            }
            _ => false,
        }
    }

    /// Get the HTTP status code if available.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Authentication { .. } => Some(401),
            Self::InvalidRequest { .. } => Some(400),
            Self::Unavailable { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api { request_id, .. } | Self::RateLimited { request_id, .. } => {
                request_id.as_deref()
            }
            _ => None,
        }
    }

    /// Get the retry-after duration if available.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => {
                retry_after.map(std::time::Duration::from_secs)
            }
            _ => None,
        }
    }

    /// The raw text that triggered a stream error, for diagnostics.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::StreamDecode { raw, .. } | Self::StreamApi { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

fn type_suffix(error_type: &Option<String>) -> String {
    error_type
        .as_deref()
        .map(|t| format!(" ({t})"))
        .unwrap_or_default()
}

/// Error body returned by the API, both for HTTP errors and in-stream errors.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// Error type (e.g. `overloaded_error`).
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::configuration("invalid base URL");
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("invalid base URL"));
    }

    #[test]
    fn test_stream_api_display() {
        let err = Error::stream_api(
            Some("overloaded_error".to_string()),
            "Service temporarily overloaded",
            "{}",
        );
        assert_eq!(
            err.to_string(),
            "Stream error (overloaded_error): Service temporarily overloaded"
        );

        let err = Error::stream_api(None, "boom", "{}");
        assert_eq!(err.to_string(), "Stream error: boom");
    }

    #[test]
    fn test_stream_errors_keep_raw_text() {
        let err = Error::stream_decode("expected value", "{not json");
        assert!(err.is_stream_error());
        assert_eq!(err.raw_payload(), Some("{not json"));
        assert!(Error::timeout(10).raw_payload().is_none());
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::rate_limited(Some(60)).is_retryable());
        assert!(Error::unavailable(529, "overloaded").is_retryable());
        assert!(Error::timeout(5000).is_retryable());
        assert!(Error::api(529, "overloaded").is_retryable());
        assert!(!Error::authentication("invalid key").is_retryable());
        assert!(!Error::invalid_request("bad param").is_retryable());
        assert!(!Error::stream_decode("bad", "x").is_retryable());
    }

    #[test]
    fn test_error_status_code() {
        assert_eq!(Error::api(500, "server error").status_code(), Some(500));
        assert_eq!(Error::rate_limited(None).status_code(), Some(429));
        assert_eq!(Error::authentication("bad key").status_code(), Some(401));
        assert_eq!(Error::connection("refused").status_code(), None);
    }

    #[test]
    fn test_retry_after() {
        let err = Error::rate_limited(Some(60));
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(60)));
    }

    #[test]
    fn test_api_error_body() {
        let body = r#"{"type":"error","error":{"type":"not_found_error","message":"no such model"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.error_type.as_deref(), Some("not_found_error"));
        assert_eq!(parsed.error.message, "no such model");
    }
}

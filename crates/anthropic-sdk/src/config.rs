//! Client configuration for the Anthropic SDK.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use url::Url;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
/// Environment variable overriding the API version header.
pub const VERSION_ENV: &str = "ANTHROPIC_VERSION";

/// Configuration for the Anthropic SDK client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL; always ends with `/` so relative paths join below it.
    pub(crate) base_url: Url,
    /// API key sent as `x-api-key`.
    pub(crate) api_key: Option<Secret<String>>,
    /// Value of the `anthropic-version` header.
    pub(crate) anthropic_version: String,
    /// Beta flags sent with every request.
    pub(crate) betas: Vec<String>,
    /// Total timeout of non-streaming requests.
    pub(crate) timeout: Duration,
    /// Total timeout of streamed responses; none by default.
    pub(crate) stream_timeout: Option<Duration>,
    /// Connection timeout duration.
    pub(crate) connect_timeout: Duration,
    /// User agent string.
    pub(crate) user_agent: String,
    /// Model used when a request does not name one.
    pub(crate) default_model: Option<String>,
    /// Custom headers to include in requests.
    pub(crate) custom_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Default API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com/v1/";
    /// Default `anthropic-version` header.
    pub const DEFAULT_API_VERSION: &'static str = "2023-06-01";
    /// Default request timeout (10 minutes).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
    /// Default connection timeout (10 seconds).
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default user agent.
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!("anthropic-sdk-rust/", env!("CARGO_PKG_VERSION"));

    /// Create a configuration with default values for `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            api_key: None,
            anthropic_version: Self::DEFAULT_API_VERSION.to_string(),
            betas: Vec::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            stream_timeout: None,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            default_model: None,
            custom_headers: Vec::new(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub(crate) fn api_key_value(&self) -> Option<&str> {
        self.api_key.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// Get the `anthropic-version` header value.
    pub fn anthropic_version(&self) -> &str {
        &self.anthropic_version
    }

    /// Get the client-wide beta flags.
    pub fn betas(&self) -> &[String] {
        &self.betas
    }

    /// Get the timeout of non-streaming requests.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the stream timeout, if any.
    pub fn stream_timeout(&self) -> Option<Duration> {
        self.stream_timeout
    }

    /// Get the connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Get the user agent.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get the default model.
    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    /// Get custom headers.
    pub fn custom_headers(&self) -> &[(String, String)] {
        &self.custom_headers
    }
}

/// Parse a base URL, appending the trailing slash `Url::join` needs.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::configuration(format!("Invalid base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::configuration(format!(
            "Base URL '{raw}' cannot have paths joined to it"
        )));
    }
    Ok(normalize_base_url(url))
}

fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

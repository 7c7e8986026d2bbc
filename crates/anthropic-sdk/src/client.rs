//! HTTP client for the Anthropic SDK.

use crate::batches::Batches;
use crate::config::{self, ClientConfig};
use crate::content::Message;
use crate::error::{ApiErrorResponse, Error, Result};
use crate::request::{
    beta_header, CountTokensRequest, MessagesRequest, MessagesRequestBuilder, SystemPrompt,
};
use crate::response::{MessageResponse, TokenCountResponse};
use crate::streaming::MessageStream;
use crate::tools::{Tool, ToolChoice};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use secrecy::Secret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const BETA_HEADER: &str = "anthropic-beta";
const REQUEST_ID_HEADER: &str = "request-id";

/// Client for the Anthropic Messages API.
///
/// # Example
///
/// ```rust,no_run
/// use anthropic_sdk::{Client, Models};
///
/// #[tokio::main]
/// async fn main() -> Result<(), anthropic_sdk::Error> {
///     let client = Client::builder()
///         .api_key("your-api-key")
///         .build()?;
///
///     let response = client
///         .messages()
///         .model(Models::recommended())
///         .max_tokens(1024)
///         .user("Hello!")
///         .create()
///         .await?;
///
///     println!("{}", response.text());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    /// HTTP client.
    http: reqwest::Client,
    /// Client configuration.
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client configured from `ANTHROPIC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::from_env().build()
    }

    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::configuration(format!("Invalid user agent: {e}")))?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_str(&config.anthropic_version)
                .map_err(|e| Error::configuration(format!("Invalid API version: {e}")))?,
        );

        if let Some(api_key) = config.api_key_value() {
            let mut value = HeaderValue::from_str(api_key)
                .map_err(|e| Error::configuration(format!("Invalid API key: {e}")))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("x-api-key"), value);
        }

        for (name, value) in &config.custom_headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
                Error::configuration(format!("Invalid header name '{name}': {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                Error::configuration(format!("Invalid header value for '{name}': {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        // No client-wide deadline: it would also cut off long streams.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start building a Messages API call.
    ///
    /// The client's default model is applied unless the call sets one.
    pub fn messages(&self) -> MessagesBuilder {
        MessagesBuilder::new(self.clone())
    }

    /// The Message Batches API.
    pub fn batches(&self) -> Batches<'_> {
        Batches::new(self)
    }

    /// Send a message and wait for the complete response.
    #[instrument(skip(self, request), fields(model = %request.model, endpoint = "messages"))]
    pub async fn create_message(&self, request: &MessagesRequest) -> Result<MessageResponse> {
        request.validate()?;
        let url = self.url("messages")?;

        debug!("Sending message request to {}", url);

        self.post_json(url, request, request.beta_header()).await
    }

    /// Send a message and stream the response events.
    ///
    /// The HTTP status is checked before the stream is returned, so API errors
    /// surface here rather than as stream items. The request timeout does not
    /// apply; the stream is only bounded by
    /// [`ClientBuilder::stream_timeout`], if one is set.
    #[instrument(skip(self, request), fields(model = %request.model, endpoint = "messages"))]
    pub async fn stream_message(&self, request: &MessagesRequest) -> Result<MessageStream> {
        request.validate()?;
        let url = self.url("messages")?;

        let mut request = request.clone();
        request.stream = Some(true);

        debug!("Sending streaming message request to {}", url);

        let builder = self
            .http
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&request);
        let response = self
            .send(
                self.with_betas(builder, request.beta_header()),
                self.config.stream_timeout,
            )
            .await?;

        Ok(MessageStream::from_response(response))
    }

    /// Count the input tokens of a request without running it.
    #[instrument(skip(self, request), fields(model = %request.model, endpoint = "messages/count_tokens"))]
    pub async fn count_tokens(&self, request: &CountTokensRequest) -> Result<TokenCountResponse> {
        request.validate()?;
        let url = self.url("messages/count_tokens")?;

        debug!("Counting tokens at {}", url);

        self.post_json(url, request, request.beta_header()).await
    }

    /// Build a URL below the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| Error::configuration(format!("Invalid URL path '{path}': {e}")))
    }

    pub(crate) async fn post_json<B, T>(
        &self,
        url: Url,
        body: &B,
        betas: Option<String>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.with_betas(self.http.post(url).json(body), betas);
        let response = self.send(builder, Some(self.config.timeout)).await?;
        parse_json(response).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let builder = self.with_betas(self.http.get(url), None);
        let response = self.send(builder, Some(self.config.timeout)).await?;
        parse_json(response).await
    }

    pub(crate) async fn get_text(&self, url: Url) -> Result<String> {
        let builder = self.with_betas(self.http.get(url), None);
        let response = self.send(builder, Some(self.config.timeout)).await?;
        response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e, Some(self.config.timeout)))
    }

    /// Attach the merged client and request beta flags, if any.
    fn with_betas(
        &self,
        builder: reqwest::RequestBuilder,
        request_betas: Option<String>,
    ) -> reqwest::RequestBuilder {
        let mut flags = self.config.betas.clone();
        flags.extend(
            request_betas
                .iter()
                .flat_map(|joined| joined.split(','))
                .map(str::to_owned),
        );
        match beta_header(&flags) {
            Some(value) => builder.header(BETA_HEADER, value),
            None => builder,
        }
    }

    /// Send a request with an optional total deadline; transport failures and
    /// non-2xx statuses become errors.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response> {
        let builder = match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        let response = builder
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, timeout))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(handle_error_response(response).await)
        }
    }

    /// Map a reqwest error to an SDK error.
    fn map_reqwest_error(&self, error: reqwest::Error, timeout: Option<Duration>) -> Error {
        if error.is_timeout() {
            let limit = timeout.unwrap_or(self.config.connect_timeout);
            Error::Timeout {
                duration_ms: limit.as_millis() as u64,
            }
        } else if error.is_connect() {
            Error::connection(error.to_string())
        } else {
            Error::Http(error)
        }
    }
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::connection(format!("Failed to read response body: {e}")))?;
    serde_json::from_slice(&body)
        .map_err(|e| Error::parse_error(format!("Failed to parse response: {e}")))
}

/// Turn a non-2xx response into the matching error.
async fn handle_error_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let headers = response.headers();
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let retry_after = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response.text().await.unwrap_or_default();
    let (message, error_type) = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => (parsed.error.message, parsed.error.error_type),
        Err(_) if body.is_empty() => (format!("HTTP {status}"), None),
        Err(_) => (body, None),
    };

    debug!(status, ?error_type, ?request_id, "API returned an error");

    match status {
        401 => Error::Authentication { message },
        429 => Error::RateLimited {
            retry_after,
            request_id,
        },
        503 | 529 => Error::Unavailable { status, message },
        _ => Error::Api {
            status,
            message,
            error_type,
            request_id,
        },
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("has_api_key", &self.config.has_api_key())
            .finish()
    }
}

/// Builder for creating a Client.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    api_key: Option<Secret<String>>,
    anthropic_version: Option<String>,
    betas: Vec<String>,
    timeout: Option<Duration>,
    stream_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    default_model: Option<String>,
    custom_headers: Vec<(String, String)>,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder seeded from `ANTHROPIC_API_KEY`, `ANTHROPIC_BASE_URL`
    /// and `ANTHROPIC_VERSION`. Unset or empty variables are ignored.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let mut builder = Self::new();
        if let Some(key) = var(config::API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(url) = var(config::BASE_URL_ENV) {
            builder = builder.base_url(url);
        }
        if let Some(version) = var(config::VERSION_ENV) {
            builder = builder.anthropic_version(version);
        }
        builder
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key.into()));
        self
    }

    /// Set the `anthropic-version` header.
    pub fn anthropic_version(mut self, version: impl Into<String>) -> Self {
        self.anthropic_version = Some(version.into());
        self
    }

    /// Add a beta flag sent with every request.
    pub fn beta(mut self, flag: impl Into<String>) -> Self {
        self.betas.push(flag.into());
        self
    }

    /// Set the total timeout of non-streaming requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a total timeout for streamed responses. Unset by default, so a
    /// stream may run as long as the server keeps sending.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the default model.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Add a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let base_url = config::parse_base_url(
            self.base_url
                .as_deref()
                .unwrap_or(ClientConfig::DEFAULT_BASE_URL),
        )?;

        let config = ClientConfig {
            base_url,
            api_key: self.api_key,
            anthropic_version: self
                .anthropic_version
                .unwrap_or_else(|| ClientConfig::DEFAULT_API_VERSION.to_string()),
            betas: self.betas,
            timeout: self.timeout.unwrap_or(ClientConfig::DEFAULT_TIMEOUT),
            stream_timeout: self.stream_timeout,
            connect_timeout: self
                .connect_timeout
                .unwrap_or(ClientConfig::DEFAULT_CONNECT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| ClientConfig::DEFAULT_USER_AGENT.to_string()),
            default_model: self.default_model,
            custom_headers: self.custom_headers,
        };

        Client::new(config)
    }
}

/// A Messages API call in preparation; see [`Client::messages`].
#[derive(Debug)]
pub struct MessagesBuilder {
    client: Client,
    builder: MessagesRequestBuilder,
}

impl MessagesBuilder {
    fn new(client: Client) -> Self {
        let builder = MessagesRequestBuilder::new();
        Self { client, builder }
    }

    /// Apply any [`MessagesRequestBuilder`] setting not mirrored here.
    #[must_use]
    pub fn configure(
        mut self,
        f: impl FnOnce(MessagesRequestBuilder) -> MessagesRequestBuilder,
    ) -> Self {
        self.builder = f(self.builder);
        self
    }

    /// Set the model to use.
    #[must_use]
    pub fn model(self, model: impl Into<String>) -> Self {
        self.configure(|b| b.model(model))
    }

    /// Set the maximum number of tokens to generate.
    #[must_use]
    pub fn max_tokens(self, max_tokens: u32) -> Self {
        self.configure(|b| b.max_tokens(max_tokens))
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system(self, system: impl Into<SystemPrompt>) -> Self {
        self.configure(|b| b.system(system))
    }

    /// Add a message.
    #[must_use]
    pub fn message(self, message: Message) -> Self {
        self.configure(|b| b.message(message))
    }

    /// Add several messages.
    #[must_use]
    pub fn messages(self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.configure(|b| b.messages(messages))
    }

    /// Add a user text message.
    #[must_use]
    pub fn user(self, text: impl Into<String>) -> Self {
        self.configure(|b| b.user(text))
    }

    /// Add an assistant text message.
    #[must_use]
    pub fn assistant(self, text: impl Into<String>) -> Self {
        self.configure(|b| b.assistant(text))
    }

    /// Set the temperature.
    #[must_use]
    pub fn temperature(self, temperature: f32) -> Self {
        self.configure(|b| b.temperature(temperature))
    }

    /// Enable extended thinking.
    #[must_use]
    pub fn thinking(self, budget_tokens: u32) -> Self {
        self.configure(|b| b.thinking(budget_tokens))
    }

    /// Offer a tool.
    #[must_use]
    pub fn tool(self, tool: impl Into<Tool>) -> Self {
        self.configure(|b| b.tool(tool))
    }

    /// Set the tool choice.
    #[must_use]
    pub fn tool_choice(self, choice: impl Into<ToolChoice>) -> Self {
        self.configure(|b| b.tool_choice(choice))
    }

    /// Add a beta flag for this call.
    #[must_use]
    pub fn beta(self, flag: impl Into<String>) -> Self {
        self.configure(|b| b.beta(flag))
    }

    /// Build the request without sending it.
    pub fn build(self) -> Result<MessagesRequest> {
        Self::finish(&self.client, self.builder)
    }

    fn finish(client: &Client, builder: MessagesRequestBuilder) -> Result<MessagesRequest> {
        let builder = match client.config.default_model() {
            Some(model) => builder.default_model(model),
            None => builder,
        };
        builder.build()
    }

    /// Send the request and wait for the complete message.
    pub async fn create(self) -> Result<MessageResponse> {
        let request = Self::finish(&self.client, self.builder)?;
        self.client.create_message(&request).await
    }

    /// Send the request and stream the response.
    pub async fn stream(self) -> Result<MessageStream> {
        let request = Self::finish(&self.client, self.builder)?;
        self.client.stream_message(&request).await
    }

    /// Count the input tokens this request would use.
    pub async fn count_tokens(self) -> Result<TokenCountResponse> {
        let request = Self::finish(&self.client, self.builder)?;
        self.client
            .count_tokens(&CountTokensRequest::from(&request))
            .await
    }
}

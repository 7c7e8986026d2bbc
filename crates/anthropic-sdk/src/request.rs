//! Request types for the Messages API.

use crate::content::{ContentBlock, Message};
use crate::error::{Error, Result};
use crate::tools::{Tool, ToolChoice};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Smallest thinking budget the API accepts.
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Capacity tier for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTier {
    /// Use priority capacity when available.
    Auto,
    /// Standard capacity only.
    StandardOnly,
}

impl FromStr for ServiceTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "standard_only" => Ok(Self::StandardOnly),
            other => Err(Error::invalid_parameter(
                "service_tier",
                format!("service_tier must be 'auto' or 'standard_only', got '{other}'"),
            )),
        }
    }
}

/// Extended thinking settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThinkingConfig {
    /// Think before answering, using at most `budget_tokens`.
    Enabled {
        /// Token budget, at least [`MIN_THINKING_BUDGET`].
        budget_tokens: u32,
    },
    /// No extended thinking.
    Disabled,
}

/// System prompt: plain text or content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    /// A plain string.
    Text(String),
    /// Blocks, e.g. to mark part of the prompt for caching.
    Blocks(Vec<ContentBlock>),
}

impl From<&str> for SystemPrompt {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SystemPrompt {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ContentBlock>> for SystemPrompt {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self::Blocks(blocks)
    }
}

/// Body of `POST messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// Model to use.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation so far.
    pub messages: Vec<Message>,
    /// System prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,
    /// Request metadata such as `user_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
    /// Custom stop sequences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    /// Sampling temperature (0.0 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Tools the model may call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// How tools should be used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Capacity tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<ServiceTier>,
    /// Extended thinking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    /// Stream the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Beta flags, sent in the `anthropic-beta` header rather than the body.
    #[serde(skip)]
    pub betas: Vec<String>,
}

impl MessagesRequest {
    /// Create a builder.
    pub fn builder() -> MessagesRequestBuilder {
        MessagesRequestBuilder::new()
    }

    /// Check the request against the API's documented constraints.
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::invalid_parameter("model", "model is required"));
        }
        if self.max_tokens == 0 {
            return Err(Error::invalid_parameter(
                "max_tokens",
                "max_tokens must be greater than 0",
            ));
        }
        validate_messages(&self.messages)?;

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err(Error::invalid_parameter(
                    "temperature",
                    "temperature must be between 0 and 1",
                ));
            }
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(Error::invalid_parameter(
                    "top_p",
                    "top_p must be between 0 and 1",
                ));
            }
        }
        validate_thinking(self.thinking)
    }

    /// Value of the `anthropic-beta` header: flags de-duplicated, in order.
    pub fn beta_header(&self) -> Option<String> {
        beta_header(&self.betas)
    }
}

pub(crate) fn beta_header(betas: &[String]) -> Option<String> {
    let mut seen: Vec<&str> = Vec::new();
    for beta in betas {
        let beta = beta.trim();
        if !beta.is_empty() && !seen.contains(&beta) {
            seen.push(beta);
        }
    }
    (!seen.is_empty()).then(|| seen.join(","))
}

fn validate_messages(messages: &[Message]) -> Result<()> {
    if messages.is_empty() {
        return Err(Error::invalid_parameter(
            "messages",
            "at least one message is required",
        ));
    }
    for (i, message) in messages.iter().enumerate() {
        if message.content.is_empty() {
            return Err(Error::invalid_parameter(
                "messages",
                format!("messages[{i}] must have content"),
            ));
        }
    }
    Ok(())
}

fn validate_thinking(thinking: Option<ThinkingConfig>) -> Result<()> {
    match thinking {
        Some(ThinkingConfig::Enabled { budget_tokens }) if budget_tokens < MIN_THINKING_BUDGET => {
            Err(Error::invalid_parameter(
                "thinking",
                format!("thinking.budget_tokens must be at least {MIN_THINKING_BUDGET}"),
            ))
        }
        _ => Ok(()),
    }
}

/// Builder for [`MessagesRequest`].
///
/// ```
/// use anthropic_sdk::{MessagesRequest, Models};
///
/// let request = MessagesRequest::builder()
///     .model(Models::fast())
///     .max_tokens(256)
///     .system("Answer briefly.")
///     .user("What is Rust?")
///     .temperature(0.0)
///     .build()
///     .unwrap();
/// assert_eq!(request.temperature, Some(0.0));
/// ```
#[derive(Debug, Default, Clone)]
pub struct MessagesRequestBuilder {
    model: Option<String>,
    max_tokens: Option<u32>,
    messages: Vec<Message>,
    system: Option<SystemPrompt>,
    metadata: Option<HashMap<String, Value>>,
    stop_sequences: Vec<String>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    tools: Vec<Tool>,
    tool_choice: Option<ToolChoice>,
    service_tier: Option<ServiceTier>,
    thinking: Option<ThinkingConfig>,
    betas: Vec<String>,
}

impl MessagesRequestBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the model unless one is already set.
    #[must_use]
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.model.get_or_insert_with(|| model.into());
        self
    }

    /// Set the maximum number of tokens to generate.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Append a message.
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Append several messages.
    #[must_use]
    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Append a user text message.
    #[must_use]
    pub fn user(self, text: impl Into<String>) -> Self {
        self.message(Message::user().text(text))
    }

    /// Append an assistant text message.
    #[must_use]
    pub fn assistant(self, text: impl Into<String>) -> Self {
        self.message(Message::assistant().text(text))
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system(mut self, system: impl Into<SystemPrompt>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Set `metadata.user_id`.
    #[must_use]
    pub fn user_id(self, user_id: impl Into<String>) -> Self {
        self.metadata("user_id", Value::String(user_id.into()))
    }

    /// Add a stop sequence.
    #[must_use]
    pub fn stop_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.stop_sequences.push(sequence.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the nucleus sampling parameter.
    #[must_use]
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the top-k sampling parameter.
    #[must_use]
    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Offer a tool.
    #[must_use]
    pub fn tool(mut self, tool: impl Into<Tool>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Set the tool choice; a bare string like `"auto"` is accepted.
    #[must_use]
    pub fn tool_choice(mut self, choice: impl Into<ToolChoice>) -> Self {
        self.tool_choice = Some(choice.into());
        self
    }

    /// Set the service tier.
    #[must_use]
    pub fn service_tier(mut self, tier: ServiceTier) -> Self {
        self.service_tier = Some(tier);
        self
    }

    /// Enable extended thinking with the given budget.
    #[must_use]
    pub fn thinking(mut self, budget_tokens: u32) -> Self {
        self.thinking = Some(ThinkingConfig::Enabled { budget_tokens });
        self
    }

    /// Add a beta flag.
    #[must_use]
    pub fn beta(mut self, flag: impl Into<String>) -> Self {
        self.betas.push(flag.into());
        self
    }

    /// Build and validate the request.
    pub fn build(self) -> Result<MessagesRequest> {
        let model = self
            .model
            .ok_or_else(|| Error::invalid_parameter("model", "model is required"))?;
        let max_tokens = self
            .max_tokens
            .ok_or_else(|| Error::invalid_parameter("max_tokens", "max_tokens is required"))?;

        let request = MessagesRequest {
            model,
            max_tokens,
            messages: self.messages,
            system: self.system,
            metadata: self.metadata,
            stop_sequences: self.stop_sequences,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            tools: self.tools,
            tool_choice: self.tool_choice,
            service_tier: self.service_tier,
            thinking: self.thinking,
            stream: None,
            betas: self.betas,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Body of `POST messages/count_tokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountTokensRequest {
    /// Model whose tokenizer to use.
    pub model: String,
    /// Messages to count.
    pub messages: Vec<Message>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    /// Beta flags for the `anthropic-beta` header.
    #[serde(skip)]
    pub betas: Vec<String>,
}

impl CountTokensRequest {
    /// A request for `model` over `messages`.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            system: None,
            tools: Vec::new(),
            tool_choice: None,
            thinking: None,
            betas: Vec::new(),
        }
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system(mut self, system: impl Into<SystemPrompt>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Include a tool definition in the count.
    #[must_use]
    pub fn tool(mut self, tool: impl Into<Tool>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Set the tool choice.
    #[must_use]
    pub fn tool_choice(mut self, choice: impl Into<ToolChoice>) -> Self {
        self.tool_choice = Some(choice.into());
        self
    }

    /// Count with extended thinking enabled.
    #[must_use]
    pub fn thinking(mut self, budget_tokens: u32) -> Self {
        self.thinking = Some(ThinkingConfig::Enabled { budget_tokens });
        self
    }

    /// Add a beta flag.
    #[must_use]
    pub fn beta(mut self, flag: impl Into<String>) -> Self {
        self.betas.push(flag.into());
        self
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::invalid_parameter("model", "model is required"));
        }
        validate_messages(&self.messages)?;
        validate_thinking(self.thinking)
    }

    /// Value of the `anthropic-beta` header.
    pub fn beta_header(&self) -> Option<String> {
        beta_header(&self.betas)
    }
}

impl From<&MessagesRequest> for CountTokensRequest {
    fn from(request: &MessagesRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: request.messages.clone(),
            system: request.system.clone(),
            tools: request.tools.clone(),
            tool_choice: request.tool_choice.clone(),
            thinking: request.thinking,
            betas: request.betas.clone(),
        }
    }
}

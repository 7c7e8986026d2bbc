//! Tool definitions and tool choice.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Tool {
    /// The server-side web search tool.
    #[serde(rename = "web_search_20250305")]
    WebSearch(WebSearchTool),
    /// A client tool or any other server tool, sent as given.
    #[serde(untagged)]
    Custom(Value),
}

impl Tool {
    /// A client tool described by a JSON schema.
    pub fn custom(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self::Custom(json!({
            "name": name.into(),
            "description": description.into(),
            "input_schema": input_schema,
        }))
    }
}

impl From<WebSearchTool> for Tool {
    fn from(tool: WebSearchTool) -> Self {
        Self::WebSearch(tool)
    }
}

impl From<Value> for Tool {
    fn from(value: Value) -> Self {
        Self::Custom(value)
    }
}

/// Approximate user location used to localise search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    /// Always `approximate`.
    #[serde(rename = "type")]
    pub kind: String,
    /// ISO country code.
    pub country: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// IANA time zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Configuration of the web search tool.
///
/// ```
/// use anthropic_sdk::WebSearchTool;
///
/// let tool = WebSearchTool::new()
///     .allowed_domains(["docs.rs"])
///     .max_uses(3)
///     .location("US", Some("California"), None, None);
/// # let _ = tool;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchTool {
    /// Always `web_search`.
    pub name: String,
    /// Only search these domains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_domains: Vec<String>,
    /// Never search these domains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_domains: Vec<String>,
    /// Cap on searches per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<UserLocation>,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    /// Tool name sent to the API.
    pub const NAME: &'static str = "web_search";

    /// A search tool with no restrictions.
    pub fn new() -> Self {
        Self {
            name: Self::NAME.to_string(),
            allowed_domains: Vec::new(),
            blocked_domains: Vec::new(),
            max_uses: None,
            user_location: None,
        }
    }

    /// Restrict searches to `domains`.
    #[must_use]
    pub fn allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Exclude `domains` from searches.
    #[must_use]
    pub fn blocked_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Limit the number of searches.
    #[must_use]
    pub fn max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    /// Set an approximate user location.
    #[must_use]
    pub fn location(
        mut self,
        country: impl Into<String>,
        region: Option<&str>,
        city: Option<&str>,
        timezone: Option<&str>,
    ) -> Self {
        self.user_location = Some(UserLocation {
            kind: "approximate".to_string(),
            country: country.into(),
            region: region.map(str::to_owned),
            city: city.map(str::to_owned),
            timezone: timezone.map(str::to_owned),
        });
        self
    }
}

/// How the model should use the provided tools.
///
/// A bare string such as `"auto"` becomes `{"type": "auto"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolChoice(pub Value);

impl ToolChoice {
    /// Let the model decide.
    pub fn auto() -> Self {
        Self::from("auto")
    }

    /// Require some tool call.
    pub fn any() -> Self {
        Self::from("any")
    }

    /// Forbid tool calls.
    pub fn none() -> Self {
        Self::from("none")
    }

    /// Require a call to the named tool.
    pub fn tool(name: impl Into<String>) -> Self {
        Self(json!({"type": "tool", "name": name.into()}))
    }
}

impl From<&str> for ToolChoice {
    fn from(kind: &str) -> Self {
        Self(json!({ "type": kind }))
    }
}

impl From<String> for ToolChoice {
    fn from(kind: String) -> Self {
        Self::from(kind.as_str())
    }
}

impl From<Value> for ToolChoice {
    fn from(value: Value) -> Self {
        match value {
            Value::String(kind) => Self::from(kind),
            other => Self(other),
        }
    }
}

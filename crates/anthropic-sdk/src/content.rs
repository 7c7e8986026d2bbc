//! Message content: text, images and documents.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::path::Path;

/// Image media types accepted by the API.
pub const IMAGE_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Default prompt-cache lifetime.
pub const DEFAULT_CACHE_TTL: &str = "5m";

/// Prompt caching marker attached to a content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    /// Always `ephemeral`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Cache lifetime such as `5m` or `1h`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

impl CacheControl {
    /// An ephemeral cache entry with the given lifetime.
    pub fn ephemeral(ttl: impl Into<String>) -> Self {
        Self {
            kind: "ephemeral".to_string(),
            ttl: Some(ttl.into()),
        }
    }
}

/// Where the bytes of an image or document come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    /// Inline base64 data.
    Base64 {
        /// MIME type of the decoded data.
        media_type: String,
        /// Base64-encoded bytes.
        data: String,
    },
    /// A publicly reachable URL.
    Url {
        /// The URL.
        url: String,
    },
    /// Inline plain text (documents only).
    Text {
        /// Always `text/plain`.
        media_type: String,
        /// The text.
        data: String,
    },
}

/// Citation switch for documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citations {
    /// Whether the model may cite this document.
    pub enabled: bool,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
        #[allow(missing_docs)]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    /// An image.
    Image {
        /// Image bytes.
        source: MediaSource,
        #[allow(missing_docs)]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    /// A document such as a PDF.
    Document {
        /// Document bytes.
        source: MediaSource,
        /// Title shown to the model.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Extra context about the document.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
        #[allow(missing_docs)]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        citations: Option<Citations>,
        #[allow(missing_docs)]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    /// Any other block (`tool_use`, `tool_result`, ...), sent as given.
    #[serde(untagged)]
    Raw(Value),
}

impl ContentBlock {
    /// A text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            cache_control: None,
        }
    }

    /// An inline image. `media_type` must be one of [`IMAGE_MEDIA_TYPES`].
    pub fn image_base64(data: impl Into<String>, media_type: &str) -> Result<Self> {
        if !IMAGE_MEDIA_TYPES.contains(&media_type) {
            return Err(Error::invalid_parameter(
                "media_type",
                format!(
                    "Invalid media type '{media_type}'. Must be one of: {}",
                    IMAGE_MEDIA_TYPES.join(", ")
                ),
            ));
        }
        Ok(Self::Image {
            source: MediaSource::Base64 {
                media_type: media_type.to_string(),
                data: data.into(),
            },
            cache_control: None,
        })
    }

    /// An image fetched by the API from `url`.
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::Image {
            source: MediaSource::Url { url: url.into() },
            cache_control: None,
        }
    }

    /// Read and encode an image file; the media type comes from the extension.
    pub fn image_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let media_type = match extension(path).as_deref() {
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => {
                return Err(Error::invalid_request(format!(
                    "Invalid image file '{}'. Must be one of: {}",
                    path.display(),
                    IMAGE_MEDIA_TYPES.join(", ")
                )))
            }
        };
        Self::image_base64(read_base64(path)?, media_type)
    }

    /// An inline document, e.g. a base64 PDF.
    pub fn document_base64(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::document(MediaSource::Base64 {
            media_type: media_type.into(),
            data: data.into(),
        })
    }

    /// A document fetched by the API from `url`.
    pub fn document_url(url: impl Into<String>) -> Self {
        Self::document(MediaSource::Url { url: url.into() })
    }

    /// A plain-text document.
    pub fn document_text(text: impl Into<String>) -> Self {
        Self::document(MediaSource::Text {
            media_type: "text/plain".to_string(),
            data: text.into(),
        })
    }

    /// Read and encode a document file, titled with its file name.
    pub fn document_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let media_type = match extension(path).as_deref() {
            Some("pdf") => "application/pdf",
            Some("txt") => "text/plain",
            Some("md") => "text/markdown",
            Some("csv") => "text/csv",
            _ => "application/octet-stream",
        };
        let block = Self::document_base64(read_base64(path)?, media_type);
        Ok(match path.file_name() {
            Some(name) => block.with_title(name.to_string_lossy()),
            None => block,
        })
    }

    fn document(source: MediaSource) -> Self {
        Self::Document {
            source,
            title: None,
            context: None,
            citations: None,
            cache_control: None,
        }
    }

    /// Mark the block for prompt caching.
    ///
    /// Raw blocks get a `cache_control` key if they are JSON objects.
    #[must_use]
    pub fn with_cache(mut self, ttl: impl Into<String>) -> Self {
        let cache = CacheControl::ephemeral(ttl);
        match &mut self {
            Self::Text { cache_control, .. }
            | Self::Image { cache_control, .. }
            | Self::Document { cache_control, .. } => *cache_control = Some(cache),
            Self::Raw(Value::Object(map)) => {
                if let Ok(value) = serde_json::to_value(cache) {
                    map.insert("cache_control".to_string(), value);
                }
            }
            Self::Raw(_) => {}
        }
        self
    }

    /// Set a document title. No effect on other blocks.
    #[must_use]
    pub fn with_title(mut self, value: impl Into<String>) -> Self {
        if let Self::Document { title, .. } = &mut self {
            *title = Some(value.into());
        }
        self
    }

    /// Set document context. No effect on other blocks.
    #[must_use]
    pub fn with_context(mut self, value: impl Into<String>) -> Self {
        if let Self::Document { context, .. } = &mut self {
            *context = Some(value.into());
        }
        self
    }

    /// Enable or disable citations for a document.
    #[must_use]
    pub fn with_citations(mut self, enabled: bool) -> Self {
        if let Self::Document { citations, .. } = &mut self {
            *citations = Some(Citations { enabled });
        }
        self
    }

    /// The text of a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl From<Value> for ContentBlock {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn read_base64(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::invalid_request(format!("File not found: {} ({e})", path.display()))
    })?;
    Ok(STANDARD.encode(bytes))
}

/// Speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[allow(missing_docs)]
    User,
    #[allow(missing_docs)]
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One conversation turn.
///
/// A message made of a single uncached text block is sent with plain string
/// content; anything else is sent as an array of blocks.
///
/// ```
/// use anthropic_sdk::Message;
///
/// let message = Message::user().text("What is in this image?")
///     .image_url("https://example.com/cat.png");
/// assert_eq!(message.content.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Who is speaking.
    pub role: Role,
    /// Content blocks in order.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// An empty message for `role`.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            content: Vec::new(),
        }
    }

    /// An empty user message.
    pub fn user() -> Self {
        Self::new(Role::User)
    }

    /// An empty assistant message.
    pub fn assistant() -> Self {
        Self::new(Role::Assistant)
    }

    /// Append a text block.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.content(ContentBlock::text(text))
    }

    /// Append an inline image.
    pub fn image_base64(self, data: impl Into<String>, media_type: &str) -> Result<Self> {
        Ok(self.content(ContentBlock::image_base64(data, media_type)?))
    }

    /// Append an image by URL.
    #[must_use]
    pub fn image_url(self, url: impl Into<String>) -> Self {
        self.content(ContentBlock::image_url(url))
    }

    /// Append an image read from disk.
    pub fn image_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.content(ContentBlock::image_file(path)?))
    }

    /// Append an inline document.
    #[must_use]
    pub fn document_base64(self, data: impl Into<String>, media_type: impl Into<String>) -> Self {
        self.content(ContentBlock::document_base64(data, media_type))
    }

    /// Append a document by URL.
    #[must_use]
    pub fn document_url(self, url: impl Into<String>) -> Self {
        self.content(ContentBlock::document_url(url))
    }

    /// Append a document read from disk.
    pub fn document_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.content(ContentBlock::document_file(path)?))
    }

    /// Append any block.
    #[must_use]
    pub fn content(mut self, block: impl Into<ContentBlock>) -> Self {
        self.content.push(block.into());
        self
    }

    fn plain_text(&self) -> Option<&str> {
        match self.content.as_slice() {
            [ContentBlock::Text {
                text,
                cache_control: None,
            }] => Some(text),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireContent<B> {
    Text(String),
    Blocks(B),
}

#[derive(Serialize)]
struct WireMessageRef<'a> {
    role: Role,
    content: WireContent<&'a [ContentBlock]>,
}

#[derive(Deserialize)]
struct WireMessage {
    role: Role,
    content: WireContent<Vec<ContentBlock>>,
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let content = match self.plain_text() {
            Some(text) => WireContent::Text(text.to_owned()),
            None => WireContent::Blocks(self.content.as_slice()),
        };
        WireMessageRef {
            role: self.role,
            content,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = WireMessage::deserialize(deserializer)?;
        let content = match wire.content {
            WireContent::Text(text) => vec![ContentBlock::text(text)],
            WireContent::Blocks(blocks) => blocks,
        };
        Ok(Self {
            role: wire.role,
            content,
        })
    }
}

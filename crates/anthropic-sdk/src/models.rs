//! Known model identifiers.

/// Namespace for the published model ids.
#[derive(Debug, Clone, Copy)]
pub struct Models;

#[allow(missing_docs)]
impl Models {
    pub const CLAUDE_OPUS_4_5: &'static str = "claude-opus-4-5-20251101";
    pub const CLAUDE_OPUS_4_5_LATEST: &'static str = "claude-opus-4-5-latest";
    pub const CLAUDE_SONNET_4_5: &'static str = "claude-sonnet-4-5-20250929";
    pub const CLAUDE_SONNET_4_5_LATEST: &'static str = "claude-sonnet-4-5-latest";
    pub const CLAUDE_HAIKU_4_5: &'static str = "claude-haiku-4-5-20251001";
    pub const CLAUDE_HAIKU_4_5_LATEST: &'static str = "claude-haiku-4-5-latest";

    pub const CLAUDE_OPUS_4: &'static str = "claude-opus-4-20250514";
    pub const CLAUDE_OPUS_4_LATEST: &'static str = "claude-opus-4-latest";
    pub const CLAUDE_SONNET_4: &'static str = "claude-sonnet-4-20250514";
    pub const CLAUDE_SONNET_4_LATEST: &'static str = "claude-sonnet-4-latest";

    pub const CLAUDE_3_7_SONNET: &'static str = "claude-3-7-sonnet-20250219";
    pub const CLAUDE_3_7_SONNET_LATEST: &'static str = "claude-3-7-sonnet-latest";

    pub const CLAUDE_3_5_SONNET: &'static str = "claude-3-5-sonnet-20241022";
    pub const CLAUDE_3_5_SONNET_LATEST: &'static str = "claude-3-5-sonnet-latest";
    pub const CLAUDE_3_5_HAIKU: &'static str = "claude-3-5-haiku-20241022";
    pub const CLAUDE_3_5_HAIKU_LATEST: &'static str = "claude-3-5-haiku-latest";

    pub const CLAUDE_3_OPUS: &'static str = "claude-3-opus-20240229";
    pub const CLAUDE_3_OPUS_LATEST: &'static str = "claude-3-opus-latest";
    pub const CLAUDE_3_SONNET: &'static str = "claude-3-sonnet-20240229";
    pub const CLAUDE_3_HAIKU: &'static str = "claude-3-haiku-20240307";
}

const ALL: &[&str] = &[
    Models::CLAUDE_OPUS_4_5,
    Models::CLAUDE_OPUS_4_5_LATEST,
    Models::CLAUDE_SONNET_4_5,
    Models::CLAUDE_SONNET_4_5_LATEST,
    Models::CLAUDE_HAIKU_4_5,
    Models::CLAUDE_HAIKU_4_5_LATEST,
    Models::CLAUDE_OPUS_4,
    Models::CLAUDE_OPUS_4_LATEST,
    Models::CLAUDE_SONNET_4,
    Models::CLAUDE_SONNET_4_LATEST,
    Models::CLAUDE_3_7_SONNET,
    Models::CLAUDE_3_7_SONNET_LATEST,
    Models::CLAUDE_3_5_SONNET,
    Models::CLAUDE_3_5_SONNET_LATEST,
    Models::CLAUDE_3_5_HAIKU,
    Models::CLAUDE_3_5_HAIKU_LATEST,
    Models::CLAUDE_3_OPUS,
    Models::CLAUDE_3_OPUS_LATEST,
    Models::CLAUDE_3_SONNET,
    Models::CLAUDE_3_HAIKU,
];

impl Models {
    /// Every known model id, newest family first.
    pub fn all() -> &'static [&'static str] {
        ALL
    }

    /// Whether `model` is a known id.
    pub fn is_valid(model: &str) -> bool {
        ALL.contains(&model)
    }

    /// Balanced default for most workloads.
    pub fn recommended() -> &'static str {
        Self::CLAUDE_SONNET_4_5_LATEST
    }

    /// Lowest latency.
    pub fn fast() -> &'static str {
        Self::CLAUDE_HAIKU_4_5_LATEST
    }

    /// Most capable.
    pub fn best() -> &'static str {
        Self::CLAUDE_OPUS_4_5_LATEST
    }
}

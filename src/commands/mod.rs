//! CLI commands module.

pub mod batches;
pub mod chat;
pub mod completions;
pub mod count_tokens;
pub mod models;

use anyhow::{Context, Result};
use anthropic_sdk::{Client, ClientBuilder};

/// Connection settings shared by every command that talks to the API.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    /// Overrides `ANTHROPIC_BASE_URL`.
    pub base_url: Option<String>,
    /// Overrides `ANTHROPIC_API_KEY`.
    pub api_key: Option<String>,
}

impl Connection {
    /// Build the SDK client, layering flags over the environment.
    pub fn client(&self) -> Result<Client> {
        let mut builder = ClientBuilder::from_env();

        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url);
        }

        match self.api_key {
            Some(ref key) => builder = builder.api_key(key),
            None if std::env::var(anthropic_sdk::API_KEY_ENV).is_err() => {
                tracing::warn!("no API key configured; requests will be rejected");
            }
            None => {}
        }

        builder.build().context("failed to configure the API client")
    }
}

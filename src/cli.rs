//! CLI argument definitions using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Connection};

/// Talk to Claude through the Anthropic Messages API
#[derive(Parser, Debug)]
#[command(name = "anthropic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL
    #[arg(short = 'u', long, env = "ANTHROPIC_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API key for authentication
    #[arg(short = 'k', long, env = "ANTHROPIC_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a message and print the reply
    Chat(commands::chat::ChatArgs),

    /// Count the input tokens of a message
    #[command(name = "count-tokens")]
    CountTokens(commands::count_tokens::CountTokensArgs),

    /// List known model ids
    Models(commands::models::ModelsArgs),

    /// Manage message batches
    Batches(commands::batches::BatchesArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let connection = Connection {
            base_url: self.base_url,
            api_key: self.api_key,
        };

        match self.command {
            Commands::Chat(args) => commands::chat::execute(args, &connection, self.json).await,
            Commands::CountTokens(args) => {
                commands::count_tokens::execute(args, &connection, self.json).await
            }
            Commands::Models(args) => commands::models::execute(args, self.json),
            Commands::Batches(args) => {
                commands::batches::execute(args, &connection, self.json).await
            }
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

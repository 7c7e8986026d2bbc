//! Count-tokens command - report the input size of a message before sending it.

use anyhow::Result;
use anthropic_sdk::Models;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::chat::compose_message;
use super::Connection;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the count-tokens command.
#[derive(Args, Debug)]
pub struct CountTokensArgs {
    /// Message to count
    pub message: String,

    /// Model whose tokenizer to use
    #[arg(short = 'M', long, default_value = Models::CLAUDE_SONNET_4_5_LATEST)]
    pub model: String,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Include an image file
    #[arg(long, value_name = "PATH")]
    pub image: Vec<PathBuf>,

    /// Include a document file
    #[arg(long, value_name = "PATH")]
    pub document: Vec<PathBuf>,

    /// Count as if extended thinking were enabled with this budget
    #[arg(long, value_name = "BUDGET")]
    pub thinking: Option<u32>,
}

#[derive(Debug, Serialize)]
struct TokenCount {
    model: String,
    input_tokens: u64,
}

/// Execute the count-tokens command.
pub async fn execute(args: CountTokensArgs, connection: &Connection, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let client = connection.client()?;
    let message = compose_message(&args.message, &args.image, &args.document)?;

    let mut request = client
        .messages()
        .model(&args.model)
        // Required by the builder; not sent to the counting endpoint.
        .max_tokens(1)
        .message(message);
    if let Some(ref system) = args.system {
        request = request.system(system.as_str());
    }
    if let Some(budget) = args.thinking {
        request = request.thinking(budget);
    }

    let result = request.count_tokens().await;

    match (result, format) {
        (Ok(count), OutputFormat::Json) => CommandResult::success(TokenCount {
            model: args.model,
            input_tokens: count.input_tokens,
        })
        .print(format)?,
        (Ok(count), OutputFormat::Text) => {
            output::success(&format!("{} input tokens", count.input_tokens));
            output::key_value("Model", &args.model);
        }
        (Err(e), _) => {
            CommandResult::<TokenCount>::failure(format!("Token count failed: {e}")).print(format)?;
        }
    }

    Ok(())
}

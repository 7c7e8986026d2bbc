//! Shell completions command.

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Arguments for the completions command.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Name the binary is installed under, if not `anthropic`
    #[arg(long)]
    pub bin_name: Option<String>,
}

/// Write the completion script to stdout.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = args
        .bin_name
        .unwrap_or_else(|| cmd.get_name().to_string());

    generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}

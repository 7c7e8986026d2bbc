//! Models command - list the model ids the SDK knows about.

use anyhow::Result;
use anthropic_sdk::Models;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the models command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Filter models by name pattern
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only show `-latest` aliases
    #[arg(long)]
    pub aliases: bool,

    /// Check whether a specific model id is known
    #[arg(long)]
    pub check: Option<String>,
}

/// Model information for table display.
#[derive(Debug, Tabled, Serialize, PartialEq, Eq)]
pub struct ModelRow {
    #[tabled(rename = "Model ID")]
    pub id: String,
    #[tabled(rename = "Alias")]
    #[serde(rename = "alias")]
    pub is_alias: bool,
    #[tabled(rename = "Role")]
    pub role: String,
}

fn role_of(id: &str) -> &'static str {
    if id == Models::recommended() {
        "recommended"
    } else if id == Models::fast() {
        "fast"
    } else if id == Models::best() {
        "best"
    } else {
        ""
    }
}

/// Rows for every known model matching the filters.
fn rows(args: &ModelsArgs) -> Vec<ModelRow> {
    let filter = args.filter.as_deref().map(str::to_lowercase);

    Models::all()
        .iter()
        .filter(|id| !args.aliases || id.ends_with("-latest"))
        .filter(|id| filter.as_ref().map_or(true, |f| id.contains(f.as_str())))
        .map(|id| ModelRow {
            id: (*id).to_string(),
            is_alias: id.ends_with("-latest"),
            role: role_of(id).to_string(),
        })
        .collect()
}

/// Execute the models command.
pub fn execute(args: ModelsArgs, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);

    if let Some(ref model) = args.check {
        let known = Models::is_valid(model);
        match format {
            OutputFormat::Json => {
                CommandResult::success(serde_json::json!({"model": model, "known": known}))
                    .print(format)?;
            }
            OutputFormat::Text if known => output::success(&format!("{model} is a known model")),
            OutputFormat::Text => output::warning(&format!("{model} is not a known model id")),
        }
        return Ok(());
    }

    let models = rows(&args);

    match format {
        OutputFormat::Json => CommandResult::success(models).print(format)?,
        OutputFormat::Text if models.is_empty() => {
            output::warning("No models found matching the criteria");
        }
        OutputFormat::Text => {
            output::success(&format!("Found {} models", models.len()));
            println!();
            output::table(&models);
        }
    }

    Ok(())
}

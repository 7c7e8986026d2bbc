//! Batches command - submit and inspect message batches.

use anyhow::{Context, Result};
use anthropic_sdk::{parse_jsonl, Batch, BatchOutcome, BatchRequest, BatchResult, ListOptions};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;

use super::Connection;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the batches command.
#[derive(Args, Debug)]
pub struct BatchesArgs {
    #[command(subcommand)]
    pub action: BatchAction,
}

#[derive(Subcommand, Debug)]
pub enum BatchAction {
    /// List batches, newest first
    List {
        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,
        /// Show batches after this id
        #[arg(long)]
        after: Option<String>,
        /// Show batches before this id
        #[arg(long)]
        before: Option<String>,
    },
    /// Show one batch
    Get {
        /// Batch id
        id: String,
    },
    /// Request cancellation of a batch
    Cancel {
        /// Batch id
        id: String,
    },
    /// Download the results of an ended batch
    Results {
        /// Batch id
        id: String,
    },
    /// Submit a batch from a JSONL file of `{"custom_id", "params"}` lines
    Create {
        /// Path to the JSONL file
        file: PathBuf,
    },
}

/// Batch summary for table display.
#[derive(Debug, Tabled, Serialize)]
pub struct BatchRow {
    #[tabled(rename = "Batch ID")]
    pub id: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Succeeded")]
    pub succeeded: u64,
    #[tabled(rename = "Errored")]
    pub errored: u64,
    #[tabled(rename = "Total")]
    pub total: u64,
    #[tabled(rename = "Created")]
    pub created_at: String,
}

impl From<&Batch> for BatchRow {
    fn from(batch: &Batch) -> Self {
        Self {
            id: batch.id.clone(),
            status: batch.processing_status.to_string(),
            succeeded: batch.request_counts.succeeded,
            errored: batch.request_counts.errored,
            total: batch.total_requests(),
            created_at: batch.created_at.clone(),
        }
    }
}

/// One result line for table display.
#[derive(Debug, Tabled, PartialEq, Eq)]
pub struct ResultRow {
    #[tabled(rename = "Custom ID")]
    pub custom_id: String,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
    #[tabled(rename = "Output")]
    pub output: String,
}

const PREVIEW_CHARS: usize = 60;

impl From<&BatchResult> for ResultRow {
    fn from(result: &BatchResult) -> Self {
        let (outcome, output) = match &result.result {
            BatchOutcome::Succeeded { message } => ("succeeded", preview(&message.text())),
            BatchOutcome::Errored { error } => (
                "errored",
                error["error"]["message"]
                    .as_str()
                    .or_else(|| error["message"].as_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
            BatchOutcome::Canceled => ("canceled", String::new()),
            BatchOutcome::Expired => ("expired", String::new()),
        };
        Self {
            custom_id: result.custom_id.clone(),
            outcome: outcome.to_string(),
            output,
        }
    }
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

/// Read batch entries from a JSONL file.
fn load_requests(path: &Path) -> Result<Vec<BatchRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    parse_jsonl(&text).with_context(|| format!("invalid batch file {}", path.display()))
}

fn print_batch(batch: &Batch, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => CommandResult::success(batch).print(format),
        OutputFormat::Text => {
            output::section(&batch.id);
            output::key_value("Status", &batch.processing_status.to_string());
            let counts = &batch.request_counts;
            output::key_value(
                "Requests",
                &format!(
                    "{} total, {} processing, {} succeeded, {} errored, {} canceled, {} expired",
                    batch.total_requests(),
                    counts.processing,
                    counts.succeeded,
                    counts.errored,
                    counts.canceled,
                    counts.expired
                ),
            );
            output::key_value("Created", &batch.created_at);
            if let Some(ref ended) = batch.ended_at {
                output::key_value("Ended", ended);
            }
            if let Some(ref expires) = batch.expires_at {
                output::key_value("Expires", expires);
            }
            if let Some(ref url) = batch.results_url {
                output::key_value("Results", url);
            }
            Ok(())
        }
    }
}

/// Execute the batches command.
pub async fn execute(args: BatchesArgs, connection: &Connection, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let client = connection.client()?;
    let batches = client.batches();

    match args.action {
        BatchAction::List {
            limit,
            after,
            before,
        } => {
            let options = ListOptions {
                before_id: before,
                after_id: after,
                limit,
            };
            let page = batches.list(&options).await?;
            match format {
                OutputFormat::Json => CommandResult::success(&page).print(format)?,
                OutputFormat::Text => {
                    let rows: Vec<BatchRow> = page.data.iter().map(BatchRow::from).collect();
                    output::table(&rows);
                    if page.has_more {
                        if let Some(ref last) = page.last_id {
                            output::info(&format!("More batches: --after {last}"));
                        }
                    }
                }
            }
        }
        BatchAction::Get { id } => print_batch(&batches.retrieve(&id).await?, format)?,
        BatchAction::Cancel { id } => {
            let batch = batches.cancel(&id).await?;
            if format == OutputFormat::Text {
                output::success(&format!("Cancellation requested for {id}"));
            }
            print_batch(&batch, format)?;
        }
        BatchAction::Results { id } => {
            let spinner = (format == OutputFormat::Text).then(|| output::spinner("Downloading results..."));
            let results = batches.results(&id).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            let results = results?;
            match format {
                // One compact line per result keeps the output JSONL.
                OutputFormat::Json => {
                    for result in &results {
                        output::json_compact(result)?;
                    }
                }
                OutputFormat::Text => {
                    let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
                    output::table(&rows);
                }
            }
        }
        BatchAction::Create { file } => {
            let requests = load_requests(&file)?;
            let batch = batches.create(&requests).await?;
            let summary = format!("Submitted {} requests as {}", requests.len(), batch.id);
            match format {
                OutputFormat::Json => CommandResult::success(&batch)
                    .with_message(summary)
                    .print(format)?,
                OutputFormat::Text => {
                    output::success(&summary);
                    print_batch(&batch, format)?;
                }
            }
        }
    }

    Ok(())
}

//! Chat command - send messages and print Claude's reply.

use anyhow::{Context, Result};
use anthropic_sdk::{
    Client, Message, MessageAccumulator, MessageResponse, MessageStream, MessagesBuilder, Models,
    StreamedMessage, Usage,
};
use clap::Args;
use futures::StreamExt;
use serde::Serialize;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use super::Connection;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send (if not provided, reads from stdin)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Model to use
    #[arg(short = 'M', long, default_value = Models::CLAUDE_SONNET_4_5_LATEST)]
    pub model: String,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Print the reply as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Temperature (0.0 to 1.0)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[arg(long, default_value_t = 1024)]
    pub max_tokens: u32,

    /// Top-p sampling parameter
    #[arg(long)]
    pub top_p: Option<f32>,

    /// Enable extended thinking with this token budget (at least 1024)
    #[arg(long, value_name = "BUDGET")]
    pub thinking: Option<u32>,

    /// Attach an image file (jpeg, png, gif or webp)
    #[arg(long, value_name = "PATH")]
    pub image: Vec<PathBuf>,

    /// Attach a document file (pdf, txt, md or csv)
    #[arg(long, value_name = "PATH")]
    pub document: Vec<PathBuf>,

    /// Beta flag to send with the request
    #[arg(long)]
    pub beta: Vec<String>,

    /// Interactive chat mode
    #[arg(short, long)]
    pub interactive: bool,

    /// Show token usage
    #[arg(long)]
    pub show_usage: bool,
}

/// Chat response for output.
#[derive(Debug, Serialize)]
pub struct ChatOutput {
    pub id: String,
    pub model: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    pub usage: UsageOutput,
}

/// Token usage output.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UsageOutput {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
    pub total_tokens: u64,
}

impl From<&Usage> for UsageOutput {
    fn from(usage: &Usage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cache_creation_input_tokens: usage.cache_creation_input_tokens,
            cache_read_input_tokens: usage.cache_read_input_tokens,
            total_tokens: usage.total_tokens(),
        }
    }
}

impl From<&MessageResponse> for ChatOutput {
    fn from(response: &MessageResponse) -> Self {
        Self {
            id: response.id.clone(),
            model: response.model.clone(),
            content: response.text(),
            thinking: response.thinking(),
            stop_reason: response.stop_reason.clone(),
            usage: UsageOutput::from(&response.usage),
        }
    }
}

impl From<&StreamedMessage> for ChatOutput {
    fn from(message: &StreamedMessage) -> Self {
        let thinking = message.thinking();
        Self {
            id: message.id.clone(),
            model: message.model.clone(),
            content: message.text(),
            thinking: (!thinking.is_empty()).then_some(thinking),
            stop_reason: message.stop_reason.clone(),
            usage: UsageOutput::from(&message.usage),
        }
    }
}

/// Execute the chat command.
pub async fn execute(args: ChatArgs, connection: &Connection, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let client = connection.client()?;

    if args.interactive {
        run_interactive_mode(&client, &args).await
    } else {
        run_single_message(&client, &args, format).await
    }
}

/// Apply the sampling flags shared by single and interactive mode.
fn configure(client: &Client, args: &ChatArgs, messages: Vec<Message>) -> MessagesBuilder {
    let mut chat = client
        .messages()
        .model(&args.model)
        .max_tokens(args.max_tokens)
        .messages(messages);

    if let Some(ref system) = args.system {
        chat = chat.system(system.as_str());
    }
    if let Some(temp) = args.temperature {
        chat = chat.temperature(temp);
    }
    if let Some(top_p) = args.top_p {
        chat = chat.configure(|b| b.top_p(top_p));
    }
    if let Some(budget) = args.thinking {
        chat = chat.thinking(budget);
    }
    for flag in &args.beta {
        chat = chat.beta(flag);
    }
    chat
}

/// Build the first user message from text and any attached files.
pub(crate) fn compose_message(
    text: &str,
    images: &[PathBuf],
    documents: &[PathBuf],
) -> Result<Message> {
    let mut message = Message::user();
    for path in images {
        message = message
            .image_file(path)
            .with_context(|| format!("cannot attach image {}", path.display()))?;
    }
    for path in documents {
        message = message
            .document_file(path)
            .with_context(|| format!("cannot attach document {}", path.display()))?;
    }
    Ok(message.text(text))
}

/// Print a stream as it arrives and return the accumulated message.
async fn print_stream(stream: MessageStream) -> Result<StreamedMessage> {
    let mut accumulator = MessageAccumulator::new();
    let mut in_thinking = false;

    let mut events = std::pin::pin!(stream.typed());
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                output::stream_newline();
                return Err(e).context("stream failed");
            }
        };

        if let Some(thinking) = event.thinking_delta() {
            in_thinking = true;
            output::stream_thinking(thinking);
        } else if let Some(text) = event.text_delta() {
            if in_thinking {
                output::stream_newline();
                in_thinking = false;
            }
            output::stream_text(text);
        }
        accumulator.push(&event);
    }
    output::stream_newline();

    Ok(accumulator.into_message()?)
}

fn print_usage(usage: &Usage) {
    output::section("Token Usage");
    output::key_value("Input", &usage.input_tokens.to_string());
    output::key_value("Output", &usage.output_tokens.to_string());
    if usage.used_cache() {
        output::key_value("Cache write", &usage.cache_creation_input_tokens.to_string());
        output::key_value("Cache read", &usage.cache_read_input_tokens.to_string());
    }
    output::key_value("Total", &usage.total_tokens().to_string());
}

/// Read the whole of stdin when no message flag is given.
fn read_stdin() -> Result<String> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    Ok(input.trim().to_string())
}

/// Run a single message chat.
async fn run_single_message(client: &Client, args: &ChatArgs, format: OutputFormat) -> Result<()> {
    let text = match args.message {
        Some(ref msg) => msg.clone(),
        None => read_stdin()?,
    };

    if text.is_empty() {
        let result: CommandResult<()> = CommandResult::failure("No message provided");
        result.print(format)?;
        return Ok(());
    }

    let message = compose_message(&text, &args.image, &args.document)?;
    let chat = configure(client, args, vec![message]);

    match format {
        OutputFormat::Text if args.stream => {
            let message = print_stream(chat.stream().await?).await?;
            if args.show_usage {
                print_usage(&message.usage);
            }
        }
        OutputFormat::Text => {
            let spinner = output::spinner("Generating response...");
            let result = chat.create().await;
            spinner.finish_and_clear();

            match result {
                Ok(response) => {
                    if let Some(thinking) = response.thinking() {
                        output::stream_thinking(&thinking);
                        output::stream_newline();
                    }
                    println!("{}", response.text());
                    if response.is_truncated() {
                        output::warning("Reply stopped at the max_tokens limit");
                    }
                    if args.show_usage {
                        print_usage(&response.usage);
                    }
                }
                Err(e) => output::error(&format!("Request failed: {e}")),
            }
        }
        OutputFormat::Json => {
            let result = if args.stream {
                match chat.stream().await {
                    Ok(stream) => stream.accumulate().await.map(|m| ChatOutput::from(&m)),
                    Err(e) => Err(e),
                }
            } else {
                chat.create().await.map(|r| ChatOutput::from(&r))
            };

            match result {
                Ok(chat_output) => CommandResult::success(chat_output).print(format)?,
                Err(e) => CommandResult::<ChatOutput>::failure(e.to_string()).print(format)?,
            }
        }
    }

    Ok(())
}

/// Run interactive chat mode.
async fn run_interactive_mode(client: &Client, args: &ChatArgs) -> Result<()> {
    output::info(&format!(
        "Interactive chat with {} (type 'exit' to quit)",
        args.model
    ));
    if let Some(ref system) = args.system {
        output::info(&format!("System: {system}"));
    }
    println!();

    let mut history: Vec<Message> = Vec::new();

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            output::info("Goodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        // Attachments ride along with the first turn only.
        let message = if history.is_empty() {
            compose_message(input, &args.image, &args.document)?
        } else {
            Message::user().text(input)
        };
        history.push(message);

        let chat = configure(client, args, history.clone());

        let reply = if args.stream {
            print!("Assistant: ");
            io::stdout().flush()?;
            match chat.stream().await {
                Ok(stream) => print_stream(stream)
                    .await
                    .map(|m| (m.text(), m.usage))
                    .map_err(|e| format!("{e:#}")),
                Err(e) => Err(e.to_string()),
            }
        } else {
            let spinner = output::spinner("Thinking...");
            let result = chat.create().await;
            spinner.finish_and_clear();
            result
                .map(|r| {
                    println!("Assistant: {}", r.text());
                    (r.text(), r.usage)
                })
                .map_err(|e| e.to_string())
        };

        match reply {
            Ok((text, usage)) => {
                if !text.is_empty() {
                    history.push(Message::assistant().text(text));
                }
                if args.show_usage {
                    output::info(&format!(
                        "Tokens: {} input, {} output, {} total",
                        usage.input_tokens,
                        usage.output_tokens,
                        usage.total_tokens()
                    ));
                }
            }
            Err(e) => {
                output::error(&format!("Error: {e}"));
                history.pop();
            }
        }

        println!();
    }

    Ok(())
}

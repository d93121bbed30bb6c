// `ragdesk chat` and `ragdesk history`: ask questions about a workspace.

use std::io::Write;

use anyhow::Context;
use clap::Args;
use ragdesk_client::chat::{empty_state_message, IgnoreReason, SendOutcome};
use ragdesk_common::types::{ChatMessage, QueryLogEntry, Source};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{short_time, ClientEngine};
use crate::exit_code::UsageError;
use crate::output::{self, OutputFormat};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Workspace id.
    workspace: String,
    /// Ask a single question and exit instead of starting a session.
    #[arg(long, short)]
    query: Option<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Workspace id.
    workspace: String,
    /// Number of entries to fetch.
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

#[derive(Debug, Serialize)]
pub struct History {
    pub workspace_id: String,
    pub entries: Vec<QueryLogEntry>,
}

pub async fn run(engine: &ClientEngine, args: ChatArgs, format: OutputFormat) -> anyhow::Result<()> {
    let view = engine.open_workspace(&args.workspace);

    if let Some(query) = args.query {
        let outcome = view.chat.send(&query).await;
        output::print_output(format, &outcome, format_outcome)?;
        return match outcome {
            SendOutcome::Answered(_) => Ok(()),
            SendOutcome::Failed(message) => Err(anyhow::anyhow!(message.content)),
            SendOutcome::Ignored(_) => Err(UsageError::new("the query is empty").into()),
        };
    }

    // The document count only feeds the greeting; a failed refresh is logged.
    let _ = view.tracker.refresh().await;
    if format == OutputFormat::Human {
        println!("{}", empty_state_message(view.tracker.ready_count()));
        println!("Type /quit to leave.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if format == OutputFormat::Human {
            eprint!("> ");
            std::io::stderr().flush().context("failed to write prompt")?;
        }
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }
        let outcome = view.chat.send(&line).await;
        if matches!(outcome, SendOutcome::Ignored(IgnoreReason::EmptyQuery)) {
            continue;
        }
        output::print_output(format, &outcome, format_outcome)?;
    }
    Ok(())
}

pub async fn history(engine: &ClientEngine, args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let view = engine.open_workspace(&args.workspace);
    let entries = view.chat.fetch_history(args.limit).await.context("failed to load chat history")?;
    let history = History { workspace_id: args.workspace, entries };
    output::print_output(format, &history, format_history)?;
    Ok(())
}

fn format_outcome(outcome: &SendOutcome) -> String {
    match outcome {
        SendOutcome::Answered(message) => format_answer(message),
        SendOutcome::Failed(message) => format!("error: {}", message.content),
        SendOutcome::Ignored(IgnoreReason::Busy) => "(still waiting for the previous answer)".into(),
        SendOutcome::Ignored(IgnoreReason::EmptyQuery) => String::new(),
    }
}

fn format_answer(message: &ChatMessage) -> String {
    let mut lines = vec![message.content.clone()];
    if !message.sources.is_empty() {
        lines.push(String::new());
        lines.push("Sources:".into());
        for (i, source) in message.sources.iter().enumerate() {
            lines.push(format_source(i + 1, source));
        }
    }
    if let Some(ms) = message.duration_ms {
        lines.push(format!("({ms:.0}ms)"));
    }
    lines.join("\n")
}

fn format_source(n: usize, source: &Source) -> String {
    let mut line = format!("  [{n}] {} ({:.0}% match)", source.filename, source.score * 100.0);
    let preview = source.preview.trim();
    if !preview.is_empty() {
        line.push_str("\n      ");
        line.push_str(&truncate(preview, PREVIEW_CHARS));
    }
    line
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

fn format_history(history: &History) -> String {
    if history.entries.is_empty() {
        return format!("No queries yet in {}.", history.workspace_id);
    }
    let mut lines = Vec::new();
    for entry in &history.entries {
        let duration = entry.duration_ms.map(|ms| format!("{ms:.0}ms")).unwrap_or_else(|| "-".into());
        lines.push(format!(
            "{}  {}  ({duration}, {} sources)",
            short_time(entry.created_at),
            entry.query,
            entry.sources_count
        ));
    }
    lines.join("\n")
}

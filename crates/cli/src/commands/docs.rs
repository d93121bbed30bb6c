// `ragdesk docs`: list, upload and delete documents in a workspace.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Subcommand};
use ragdesk_client::documents::{UploadFailure, UploadReport};
use ragdesk_client::gateway::UploadFile;
use ragdesk_common::types::{Document, DocumentStatus};
use serde::Serialize;
use tracing::info;

use super::workspaces::{format_deleted, Deleted};
use super::ClientEngine;
use crate::output::{self, OutputFormat};
use crate::prompt;

#[derive(Debug, Subcommand)]
pub enum DocsCommand {
    /// List documents and their indexing status
    List(ListArgs),
    /// Upload files one at a time
    Upload(UploadArgs),
    /// Delete a document
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Workspace id.
    workspace: String,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Workspace id.
    workspace: String,
    /// Files to upload.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Wait until every uploaded document finished indexing.
    #[arg(long)]
    wait: bool,
    /// Give up waiting after this many seconds.
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Workspace id.
    workspace: String,
    /// Document id.
    id: String,
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,
}

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub workspace_id: String,
    pub ready: usize,
    pub documents: Vec<Document>,
}

#[derive(Debug, Serialize)]
pub struct UploadResult {
    #[serde(flatten)]
    pub report: UploadReport,
    pub documents: Vec<Document>,
}

pub async fn run(engine: &ClientEngine, cmd: DocsCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DocsCommand::List(args) => list(engine, args, format).await,
        DocsCommand::Upload(args) => upload(engine, args, format).await,
        DocsCommand::Delete(args) => delete(engine, args, format).await,
    }
}

async fn list(engine: &ClientEngine, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let view = engine.open_workspace(&args.workspace);
    view.tracker.refresh().await.context("failed to list documents")?;
    let result = DocumentList {
        workspace_id: args.workspace,
        ready: view.tracker.ready_count(),
        documents: view.tracker.documents(),
    };
    output::print_output(format, &result, format_list)?;
    Ok(())
}

async fn upload(engine: &ClientEngine, args: UploadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let view = engine.open_workspace(&args.workspace);

    let mut files = Vec::with_capacity(args.files.len());
    let mut slots = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match UploadFile::from_path(path).await {
            Ok(file) => {
                slots.push(Ok(file.filename.clone()));
                files.push(file);
            }
            Err(e) => slots.push(Err(UploadFailure {
                filename: path.display().to_string(),
                reason: format!("could not read file: {e}"),
            })),
        }
    }

    let mut report = view.tracker.upload(files).await;
    report.failed = in_submission_order(slots, std::mem::take(&mut report.failed));

    if args.wait && !report.uploaded.is_empty() {
        info!(workspace = %args.workspace, "waiting for indexing");
        tokio::time::timeout(
            Duration::from_secs(args.timeout_secs),
            view.tracker.wait_until_indexed(),
        )
        .await
        .with_context(|| format!("documents still indexing after {}s", args.timeout_secs))?;
    }

    let result = UploadResult { report, documents: view.tracker.documents() };
    output::print_output(format, &result, format_upload)?;

    if !result.report.is_clean() {
        anyhow::bail!(
            "{} of {} file(s) failed to upload",
            result.report.failed.len(),
            result.report.attempted()
        );
    }
    Ok(())
}

async fn delete(engine: &ClientEngine, args: DeleteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let question = format!("Delete document {}?", args.id);
    let deleted = if prompt::confirm(&question, args.yes)? {
        let view = engine.open_workspace(&args.workspace);
        view.tracker.delete(&args.id).await.context("failed to delete document")?;
        true
    } else {
        false
    };
    output::print_output(format, &Deleted { id: args.id, deleted }, format_deleted)?;
    Ok(())
}

/// Merge read failures back into the batch's failures so both follow the
/// order the files were given on the command line. `slots` holds, per
/// argument, the name that was sent or the reason it could not be read.
fn in_submission_order(
    slots: Vec<Result<String, UploadFailure>>,
    sent_failures: Vec<UploadFailure>,
) -> Vec<UploadFailure> {
    let mut sent_failures = sent_failures.into_iter().peekable();
    let mut ordered = Vec::new();
    for slot in slots {
        match slot {
            Err(unreadable) => ordered.push(unreadable),
            Ok(name) => {
                if let Some(failure) = sent_failures.next_if(|f| f.filename == name) {
                    ordered.push(failure);
                }
            }
        }
    }
    ordered.extend(sent_failures);
    ordered
}

fn format_list(list: &DocumentList) -> String {
    if list.documents.is_empty() {
        return format!(
            "No documents yet. Upload some with: ragdesk docs upload {} <files>",
            list.workspace_id
        );
    }

    let mut lines =
        vec![format!("{} document(s), {} indexed", list.documents.len(), list.ready)];
    lines.extend(list.documents.iter().map(format_row));
    lines.join("\n")
}

fn format_row(doc: &Document) -> String {
    let mut details = Vec::new();
    let size = doc.size_label();
    if !size.is_empty() {
        details.push(size);
    }
    if doc.status == DocumentStatus::Ready {
        details.push(format!("{} chunks", doc.chunk_count));
    }
    let mut row = format!("  {:<10} {}  {}", doc.status.as_str(), doc.id, doc.filename);
    if !details.is_empty() {
        row.push_str(&format!(" ({})", details.join(", ")));
    }
    if let Some(message) = &doc.error_message {
        row.push_str(&format!("\n             {message}"));
    }
    row
}

fn format_upload(result: &UploadResult) -> String {
    let mut lines = vec![format!(
        "Uploaded {} of {} file(s)",
        result.report.uploaded.len(),
        result.report.attempted()
    )];
    for failure in &result.report.failed {
        lines.push(format!("  failed  {}: {}", failure.filename, failure.reason));
    }
    let processing = result.documents.iter().filter(|d| d.is_processing()).count();
    if processing > 0 {
        lines.push(format!("{processing} document(s) still indexing"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, status: DocumentStatus) -> Document {
        Document {
            id: id.into(),
            filename: format!("{id}.pdf"),
            status,
            file_size: Some(2048),
            chunk_count: 4,
            file_type: Some("pdf".into()),
            error_message: None,
            created_at: None,
        }
    }

    fn failure(filename: &str, reason: &str) -> UploadFailure {
        UploadFailure { filename: filename.into(), reason: reason.into() }
    }

    #[test]
    fn failures_follow_command_line_order() {
        let slots = vec![
            Ok("a.pdf".to_string()),
            Err(failure("missing.pdf", "could not read file: not found")),
            Ok("b.exe".to_string()),
            Ok("c.md".to_string()),
            Err(failure("locked.txt", "could not read file: permission denied")),
        ];
        let sent = vec![failure("b.exe", "File type .exe not allowed")];

        let names: Vec<String> =
            in_submission_order(slots, sent).into_iter().map(|f| f.filename).collect();
        assert_eq!(names, ["missing.pdf", "b.exe", "locked.txt"]);
    }

    #[test]
    fn repeated_names_keep_their_own_failures() {
        let slots = vec![Ok("a.pdf".to_string()), Ok("a.pdf".to_string())];
        let sent = vec![failure("a.pdf", "File too large. Max 20MB")];

        let ordered = in_submission_order(slots, sent);
        assert_eq!(ordered, [failure("a.pdf", "File too large. Max 20MB")]);
    }

    #[test]
    fn format_list_empty_suggests_upload() {
        let list = DocumentList { workspace_id: "w1".into(), ready: 0, documents: vec![] };
        assert!(format_list(&list).contains("ragdesk docs upload w1"));
    }

    #[test]
    fn format_list_counts_and_rows() {
        let mut failed = doc("d2", DocumentStatus::Error);
        failed.error_message = Some("Could not extract text".into());
        let list = DocumentList {
            workspace_id: "w1".into(),
            ready: 1,
            documents: vec![doc("d1", DocumentStatus::Ready), failed],
        };
        let text = format_list(&list);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2 document(s), 1 indexed");
        assert_eq!(lines[1], "  ready      d1  d1.pdf (2.0KB, 4 chunks)");
        assert_eq!(lines[2], "  error      d2  d2.pdf (2.0KB)");
        assert_eq!(lines[3].trim(), "Could not extract text");
    }

    #[test]
    fn format_upload_lists_failures_and_pending_indexing() {
        let result = UploadResult {
            report: UploadReport {
                uploaded: vec!["a.pdf".into()],
                failed: vec![UploadFailure {
                    filename: "b.exe".into(),
                    reason: "File type .exe not allowed".into(),
                }],
            },
            documents: vec![doc("a", DocumentStatus::Processing)],
        };
        let text = format_upload(&result);
        assert!(text.starts_with("Uploaded 1 of 2 file(s)"));
        assert!(text.contains("failed  b.exe: File type .exe not allowed"));
        assert!(text.contains("1 document(s) still indexing"));
    }

    #[test]
    fn upload_result_json_flattens_report() {
        let result = UploadResult { report: UploadReport::default(), documents: vec![] };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["uploaded"].as_array().unwrap().is_empty());
        assert!(json["failed"].as_array().unwrap().is_empty());
    }
}

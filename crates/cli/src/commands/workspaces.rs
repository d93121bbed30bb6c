// `ragdesk workspaces`: list, create and delete workspaces.

use anyhow::Context;
use clap::{Args, Subcommand};
use ragdesk_common::types::Workspace;
use serde::Serialize;

use super::{short_time, ClientEngine};
use crate::output::{self, OutputFormat};
use crate::prompt;

#[derive(Debug, Subcommand)]
pub enum WorkspacesCommand {
    /// List workspaces, newest first
    List,
    /// Create a workspace
    Create(CreateArgs),
    /// Delete a workspace with all of its documents
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Workspace name.
    name: String,
    /// Optional description.
    #[arg(long, short)]
    description: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Workspace id.
    id: String,
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceList {
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

pub async fn run(engine: &ClientEngine, cmd: WorkspacesCommand, format: OutputFormat) -> anyhow::Result<()> {
    let registry = engine.workspaces();
    match cmd {
        WorkspacesCommand::List => {
            let workspaces = registry.try_list().await.context("failed to list workspaces")?;
            output::print_output(format, &WorkspaceList { workspaces }, format_list)?;
        }
        WorkspacesCommand::Create(args) => {
            let created = registry
                .create(&args.name, args.description.as_deref())
                .await
                .context("failed to create workspace")?;
            output::print_output(format, &created, |w| {
                format!("Created workspace {} ({})", w.name, w.id)
            })?;
        }
        WorkspacesCommand::Delete(args) => {
            let question = format!("Delete workspace {} and all of its documents?", args.id);
            let deleted = if prompt::confirm(&question, args.yes)? {
                registry.delete(&args.id).await.context("failed to delete workspace")?;
                true
            } else {
                false
            };
            output::print_output(format, &Deleted { id: args.id, deleted }, format_deleted)?;
        }
    }
    Ok(())
}

fn format_list(list: &WorkspaceList) -> String {
    if list.workspaces.is_empty() {
        return "No workspaces yet. Create one with: ragdesk workspaces create <name>".into();
    }

    let mut lines = vec![format!("{} workspace(s)", list.workspaces.len())];
    for w in &list.workspaces {
        lines.push(format!(
            "  {}  {} ({} docs, created {})",
            w.id,
            w.name,
            w.doc_count,
            short_time(w.created_at)
        ));
        if let Some(description) = &w.description {
            lines.push(format!("      {description}"));
        }
    }
    lines.join("\n")
}

pub(crate) fn format_deleted(result: &Deleted) -> String {
    if result.deleted {
        format!("Deleted {}", result.id)
    } else {
        "Cancelled.".to_string()
    }
}

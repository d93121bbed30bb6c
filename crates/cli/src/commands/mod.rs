// CLI subcommand dispatch.

use anyhow::Context;
use clap::Subcommand;
use ragdesk_client::config::ClientConfig;
use ragdesk_client::gateway::ApiGateway;
use ragdesk_client::Engine;

use crate::output::OutputFormat;

pub mod auth;
pub mod chat;
pub mod docs;
pub mod stats;
pub mod workspaces;

/// The engine every command runs against.
pub type ClientEngine = Engine<ApiGateway>;

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login(auth::LoginArgs),
    /// Create an account and sign in
    Register(auth::RegisterArgs),
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami(auth::WhoamiArgs),
    /// Check that the server is reachable
    Health,
    /// List, create or delete workspaces
    #[command(subcommand)]
    Workspaces(workspaces::WorkspacesCommand),
    /// List, upload or delete documents in a workspace
    #[command(subcommand)]
    Docs(docs::DocsCommand),
    /// Ask questions about a workspace's documents
    Chat(chat::ChatArgs),
    /// Show past queries in a workspace
    History(chat::HistoryArgs),
    /// Show usage statistics
    Stats,
}

pub async fn run(cmd: Command, format: OutputFormat) -> anyhow::Result<()> {
    let engine = Engine::from_config(ClientConfig::load()).context("failed to start client")?;
    match cmd {
        Command::Login(args) => auth::login(&engine, args, format).await,
        Command::Register(args) => auth::register(&engine, args, format).await,
        Command::Logout => auth::logout(&engine, format),
        Command::Whoami(args) => auth::whoami(&engine, args, format).await,
        Command::Health => auth::health(&engine, format).await,
        Command::Workspaces(cmd) => workspaces::run(&engine, cmd, format).await,
        Command::Docs(cmd) => docs::run(&engine, cmd, format).await,
        Command::Chat(args) => chat::run(&engine, args, format).await,
        Command::History(args) => chat::history(&engine, args, format).await,
        Command::Stats => stats::run(&engine, format).await,
    }
}

/// `2025-01-02 03:04`, or `-` when the server sent no timestamp.
pub(crate) fn short_time(at: Option<impl std::fmt::Display>) -> String {
    match at {
        Some(at) => {
            let text = at.to_string();
            text.get(..16).unwrap_or(&text).replace('T', " ")
        }
        None => "-".to_string(),
    }
}

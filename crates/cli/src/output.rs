// Output format selection and error reporting for the CLI.
//
// A terminal gets human-readable text, anything else gets one JSON object
// per response. `--json` forces JSON.

use std::io::{self, IsTerminal, Write};

use ragdesk_client::config::API_URL_ENV;
use ragdesk_client::gateway::ApiError;
use ragdesk_client::workspaces::WorkspaceError;
use serde::Serialize;

use crate::exit_code::{AuthFailure, UsageError};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (tables, colors, etc.).
    Human,
    /// Machine-readable JSON (one object per response).
    Json,
}

impl OutputFormat {
    /// Auto-detect format: JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    /// Testable variant that takes an explicit `is_tty` flag.
    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout: `human_fn` renders it for a terminal, JSON
/// otherwise.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Same as [`print_output`] with an explicit writer.
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", human_fn(value))
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Write an error to stderr in the selected format.
pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    let mut err = io::stderr().lock();
    match format {
        OutputFormat::Human => {
            let line =
                render_human_stderr_line("error", message, io::stderr().is_terminal(), ANSI_RED);
            let _ = writeln!(err, "{line}");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            let _ = serde_json::to_writer(&mut err, &obj);
            let _ = writeln!(err);
        }
    }
}

/// Print a mapped, actionable error for a command failure.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    for cause in error.chain() {
        if let Some(api_err) = cause.downcast_ref::<ApiError>() {
            return actionable_api_error(api_err);
        }
        if let Some(WorkspaceError::Api(api_err)) = cause.downcast_ref::<WorkspaceError>() {
            return actionable_api_error(api_err);
        }
        if let Some(failure) = cause.downcast_ref::<AuthFailure>() {
            return ("AUTH_FAILURE", failure.reason.clone());
        }
        if let Some(usage) = cause.downcast_ref::<UsageError>() {
            return ("USAGE", usage.message.clone());
        }
    }
    ("ERROR", format!("{error:#}"))
}

fn actionable_api_error(error: &ApiError) -> (&'static str, String) {
    match error {
        ApiError::Unauthenticated => {
            ("AUTH_REQUIRED", "Not signed in. Run: ragdesk login <email>".to_string())
        }
        ApiError::Status { status: 401 | 403, .. } => (
            "AUTH_FAILURE",
            "The server rejected the saved session. Run: ragdesk login <email>".to_string(),
        ),
        ApiError::Status { status: 404, detail } => {
            ("NOT_FOUND", detail.clone().unwrap_or_else(|| "Not found".to_string()))
        }
        ApiError::Status { .. } => ("SERVER_ERROR", error.to_string()),
        ApiError::Transport(reason) => (
            "NETWORK_ERROR",
            format!(
                "Could not reach the server ({reason}). Check api_url in ~/.ragdesk/config.toml \
                 or set {API_URL_ENV}"
            ),
        ),
        ApiError::Decode(_) => ("BAD_RESPONSE", error.to_string()),
        ApiError::InvalidUrl(_) => (
            "INVALID_API_URL",
            format!("{error}. Use an http(s) URL such as http://localhost:8000/api"),
        ),
    }
}

fn render_human_stderr_line(label: &str, message: &str, is_tty: bool, color: &str) -> String {
    if is_tty {
        format!("{color}{label}:{ANSI_RESET} {message}")
    } else {
        format!("{label}: {message}")
    }
}

// Consistent exit codes for the ragdesk CLI.
//
//   0  = success
//   1  = general error
//   2  = usage/argument error
//   11 = authentication error
//   13 = network error

use std::process;

use ragdesk_client::gateway::ApiError;
use ragdesk_client::workspaces::WorkspaceError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Auth = 11,
    Network = 13,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(api_err) = cause.downcast_ref::<ApiError>() {
                return Self::from_api_error(api_err);
            }
            if let Some(ws_err) = cause.downcast_ref::<WorkspaceError>() {
                return match ws_err {
                    WorkspaceError::Validation(_) => Self::Usage,
                    WorkspaceError::Api(api_err) => Self::from_api_error(api_err),
                };
            }
            if cause.downcast_ref::<AuthFailure>().is_some() {
                return Self::Auth;
            }
            if cause.downcast_ref::<UsageError>().is_some() {
                return Self::Usage;
            }
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
                return match io_err.kind() {
                    std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::TimedOut => {
                        Self::Network
                    }
                    _ => Self::Error,
                };
            }
        }
        Self::Error
    }

    pub fn from_api_error(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthenticated => Self::Auth,
            ApiError::Status { status: 401 | 403, .. } => Self::Auth,
            ApiError::Transport(_) => Self::Network,
            ApiError::InvalidUrl(_) => Self::Usage,
            ApiError::Status { .. } | ApiError::Decode(_) => Self::Error,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

/// Login or registration was refused. Carries the reason recorded on the
/// session.
#[derive(Debug)]
pub struct AuthFailure {
    pub reason: String,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for AuthFailure {}

/// The command line asked for something that cannot be done as given.
#[derive(Debug)]
pub struct UsageError {
    pub message: String,
}

impl UsageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UsageError {}

//! CLI-specific error types and mappings.
//!
//! Maps pipeline errors to exit codes and user-facing messages.

use anchordesk_core::{SettingsError, StudioError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Pipeline failure; carries the status-line text.
    #[error("{0}")]
    Studio(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Missing record or a record the user may not touch.
    #[error("{0}")]
    Access(String),

    /// A collaborator service could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Studio(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Access(_) => 77,   // EX_NOPERM
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<StudioError> for CliError {
    fn from(err: StudioError) -> Self {
        match &err {
            StudioError::Validation { message } => Self::Arguments(message.clone()),
            StudioError::Permission { .. } | StudioError::NotFound { .. } => {
                Self::Access(err.user_message())
            }
            StudioError::Handshake(inner) => Self::Unavailable(inner.to_string()),
            _ => Self::Studio(err.user_message()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

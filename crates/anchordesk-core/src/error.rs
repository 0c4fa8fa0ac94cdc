//! Error taxonomy for the broadcast pipeline.
//!
//! Errors are `Clone` so a single failure can be recorded on a task or queue
//! item and still be returned to the waiting caller. They carry strings
//! rather than foreign error types for the same reason.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when a start is rejected because another broadcast holds the lock.
pub const BUSY_LOCKED_MESSAGE: &str =
    "Please wait for the current operation to complete or cancel it";

/// Message shown when a start is rejected because a broadcast is still loading.
pub const BUSY_LOADING_MESSAGE: &str = "Please wait for broadcast to load or click 'Cancel'";

/// Result alias for pipeline operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Failure negotiating a broadcast session with the coordinator.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandshakeError {
    /// A single attempt did not answer within the deadline.
    #[error("Handshake attempt {attempt} timed out after {timeout_ms} ms")]
    Timeout { attempt: u32, timeout_ms: u64 },

    /// The transport call itself failed.
    #[error("Coordinator request failed: {message}")]
    Transport { message: String },

    /// The coordinator answered, but not with an acknowledgement.
    #[error("Invalid server response: {message}")]
    InvalidResponse { message: String },

    /// Every attempt failed.
    #[error("Broadcast handshake failed after maximum retry attempts ({attempts}): {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl HandshakeError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Failure reported by an adapter behind one of the ports.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PortError {
    /// The service could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The service answered with something we could not interpret.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

/// Canonical error for every pipeline stage.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StudioError {
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Model call failed or returned an unusable script.
    #[error("Dialogue generation failed: {message}")]
    Generation { message: String },

    /// Speech for the whole batch failed.
    #[error("Speech synthesis failed: {message}")]
    Synthesis { message: String },

    /// Sanitization rejected the topic or dialogue.
    #[error("Content policy violation: {message}")]
    ContentPolicy { message: String },

    /// Cooperative stop observed at a checkpoint. Not a user-facing failure.
    #[error("Broadcast canceled")]
    Cancelled,

    /// A non-owner tried to mutate a broadcast.
    #[error("Permission denied: {message}")]
    Permission { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Admission control rejected a start.
    #[error("{message}")]
    Busy { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Record store error: {message}")]
    Store { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StudioError {
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }

    pub fn content_policy(message: impl Into<String>) -> Self {
        Self::ContentPolicy {
            message: message.into(),
        }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn store(err: &PortError) -> Self {
        Self::Store {
            message: err.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for the cooperative cancellation signal.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the same request may succeed if retried later.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Handshake(_) | Self::Busy { .. } | Self::Synthesis { .. } | Self::Store { .. }
        )
    }

    /// Status-line text for the user.
    ///
    /// Cancellation has no error text; callers show a neutral status instead.
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled => "Broadcast canceled".to_string(),
            Self::Busy { message } => message.clone(),
            Self::ContentPolicy { .. } => {
                "This broadcast contains inappropriate content and cannot be played.".to_string()
            }
            Self::Permission { message } | Self::NotFound { message } => message.clone(),
            Self::Handshake(_) => {
                "Could not reach the broadcast coordinator. Please try again.".to_string()
            }
            other => format!("Error: {other}"),
        }
    }
}

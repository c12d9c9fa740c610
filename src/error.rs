use thiserror::Error;

use crate::api::ApiError;

/// Message shown when no bearer credential is available.
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please log in again.";

/// Message shown when the server rejects the bearer credential.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

#[derive(Debug, Error)]
pub enum IntakeError {
    /// Field or size violation caught before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or rejected credential. Never retried automatically.
    #[error("Authentication error: {0}")]
    AuthExpired(String),

    /// The remote call completed but reported a structured failure.
    #[error("Server rejected request (status {status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// The call did not complete, or completed without a usable message.
    #[error("Transport failure while trying to {action}: {detail}")]
    Transport { action: String, detail: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl IntakeError {
    pub fn auth_required() -> Self {
        IntakeError::AuthExpired(AUTH_REQUIRED_MESSAGE.to_string())
    }

    pub fn session_expired() -> Self {
        IntakeError::AuthExpired(SESSION_EXPIRED_MESSAGE.to_string())
    }

    /// Classifies a client error. `action` completes the sentence
    /// "Failed to ..." in the user-facing message of transport failures.
    pub fn from_api(err: ApiError, action: &str) -> Self {
        match err {
            ApiError::Unauthorized => Self::session_expired(),
            ApiError::Rejected { status, message } if !message.trim().is_empty() => {
                IntakeError::ServerRejected { status, message }
            }
            ApiError::Rejected { status, .. } => IntakeError::Transport {
                action: action.to_string(),
                detail: format!("status {status} without a message"),
            },
            other => IntakeError::Transport {
                action: action.to_string(),
                detail: other.to_string(),
            },
        }
    }

    /// The human-readable text stored as a slot's `errorMessage` or a stage banner.
    pub fn user_message(&self) -> String {
        match self {
            IntakeError::Validation(msg) | IntakeError::AuthExpired(msg) => msg.clone(),
            IntakeError::ServerRejected { message, .. } => message.clone(),
            IntakeError::Transport { action, .. } => format!("Failed to {action}. Please try again."),
            other => other.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            IntakeError::Validation(_) => FailureKind::Validation,
            IntakeError::AuthExpired(_) => FailureKind::Auth,
            IntakeError::ServerRejected { .. } => FailureKind::Server,
            IntakeError::Transport { .. } => FailureKind::Transport,
            _ => FailureKind::Internal,
        }
    }
}

/// Classifies a failure for display and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    /// Recoverable locally by correcting input.
    Validation,
    /// Requires logging in again.
    Auth,
    /// Structured rejection from the server, shown verbatim.
    Server,
    /// Network or timeout; the user may try again.
    Transport,
    /// Local I/O or configuration problem.
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Validation => write!(f, "Validation"),
            FailureKind::Auth => write!(f, "Auth"),
            FailureKind::Server => write!(f, "Server"),
            FailureKind::Transport => write!(f, "Transport"),
            FailureKind::Internal => write!(f, "Internal"),
        }
    }
}

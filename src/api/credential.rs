use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::error::IntakeError;

/// Environment variable holding the bearer token for the CLI.
pub const TOKEN_ENV_VAR: &str = "LUMOS_TOKEN";

/// Bearer credential threaded into stage controllers and upload engines.
///
/// The token value is opaque; only its presence matters to the intake flow.
/// Cloning shares the same secret.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    token: Option<Arc<SecretString>>,
}

impl Credential {
    /// Wraps a token. An empty or whitespace-only token counts as absent.
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self {
            token: Some(Arc::new(SecretString::from(token))),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Reads the token from `LUMOS_TOKEN`.
    pub fn from_env() -> Self {
        std::env::var(TOKEN_ENV_VAR)
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn is_present(&self) -> bool {
        self.token.is_some()
    }

    /// The raw token, or `AuthExpired` when no credential is held.
    pub fn bearer(&self) -> Result<&str, IntakeError> {
        self.token
            .as_deref()
            .map(|secret| secret.expose_secret())
            .ok_or_else(IntakeError::auth_required)
    }
}

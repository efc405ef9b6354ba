use thiserror::Error;

use crate::storage::RepositoryError;

/// Auth errors surfaced by the linking logic and provider clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Azure AD authentication is not configured")]
    NotConfigured,

    #[error("provider error: {0}")]
    Provider(String),

    #[error("failed to exchange authorization code: {0}")]
    CodeExchange(String),

    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    #[error("invalid or expired state parameter")]
    InvalidState,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid password")]
    InvalidPassword,

    #[error("failed to sign session token: {0}")]
    Signing(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // Uniqueness violations mean another account already claimed the
            // azure_id or email, not a storage fault.
            RepositoryError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

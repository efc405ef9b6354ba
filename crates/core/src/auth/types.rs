use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity claims extracted from an Azure AD ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureClaims {
    /// Azure's stable user identifier. Prefers the immutable `oid` claim,
    /// falling back to the generic `sub` claim.
    pub subject: String,
    /// Prefers the `email` claim, falling back to `preferred_username`.
    pub email: Option<String>,
    /// Display name, when Azure returns one.
    pub name: Option<String>,
}

/// CSRF state stored between auth initiation and the provider callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFlowState {
    pub created_at: DateTime<Utc>,
}

impl AuthFlowState {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
        }
    }
}

impl Default for AuthFlowState {
    fn default() -> Self {
        Self::new()
    }
}

/// How `AccountLinker::resolve_or_create` resolved an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// An account already held this Azure identity.
    LoggedIn,
    /// An existing account matched by email and was linked.
    Linked,
    /// No account matched; a new Azure-only account was provisioned.
    Created,
}

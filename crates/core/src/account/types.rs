use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a user authenticates.
///
/// `Azure` accounts have no password credential and cannot be unlinked
/// without becoming inaccessible. `Hybrid` accounts carry both a password
/// and a linked Azure identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Local,
    Azure,
    Hybrid,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Azure => write!(f, "azure"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// A local user account.
///
/// The password hash is never serialized; API responses carry the rest of
/// the record as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Short uppercase initials shown when the user has no avatar.
    pub icon: String,
    /// Azure AD object identifier, set once the account is linked.
    /// At most one account may hold a given value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_id: Option<String>,
    pub auth_method: AuthMethod,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub azure_linked_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a local account with no credentials attached yet.
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            icon: String::new(),
            azure_id: None,
            auth_method: AuthMethod::Local,
            password_hash: None,
            azure_linked_at: None,
            last_login: None,
            active: false,
            created_at: Utc::now(),
        }
    }

    /// Attaches an Azure identity, making this an Azure-only account.
    pub fn with_azure_id(mut self, azure_id: &str) -> Self {
        self.azure_id = Some(azure_id.to_string());
        self.auth_method = AuthMethod::Azure;
        self.azure_linked_at = Some(Utc::now());
        self
    }

    pub fn with_icon(mut self, icon: String) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_password_hash(mut self, hash: &str) -> Self {
        self.password_hash = Some(hash.to_string());
        self
    }

    pub fn as_active(mut self) -> Self {
        self.active = true;
        self
    }

    /// Whether a password credential is stored for this account.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Case-insensitive email comparison, used everywhere linking compares
    /// addresses.
    pub fn email_matches(&self, other: &str) -> bool {
        self.email.eq_ignore_ascii_case(other)
    }
}

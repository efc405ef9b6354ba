//! Azure AD (Entra ID) single-sign-on for plotdeck.
//!
//! This crate provides:
//! - An OIDC client for Azure AD (`AzureProvider`), plus a mock for tests
//! - HTTP routes for login, callback, link, and unlink
//! - JWT session-token issuance and the `CurrentUser` extractor

mod config;
mod error;
mod extractors;
mod handlers;
mod providers;
mod state;
mod stores;
mod tokens;

pub use config::{AuthConfig, AzureConfig};
pub use error::AuthError;
pub use extractors::CurrentUser;
pub use handlers::auth_routes;
pub use providers::{AzureProvider, MockProvider};
pub use state::AuthState;
pub use stores::{hash_password, InMemoryAccountStore};
pub use tokens::{TokenClaims, TokenIssuer};

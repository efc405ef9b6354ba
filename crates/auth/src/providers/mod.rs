//! Identity provider clients.
//!
//! `AzureProvider` talks to Azure AD via OIDC discovery; `MockProvider`
//! decodes self-describing authorization codes for tests and local
//! development.

mod azure;
mod mock;

pub use azure::AzureProvider;
pub use mock::MockProvider;

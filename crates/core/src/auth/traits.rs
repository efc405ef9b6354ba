use async_trait::async_trait;
use url::Url;

use super::{AuthError, AuthFlowState, AzureClaims};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Abstraction over the Azure AD identity provider.
#[async_trait]
pub trait AzureProviderClient: Send + Sync {
    /// Builds the provider-hosted login URL, embedding `state` for CSRF
    /// binding by the caller.
    async fn authorization_url(&self, state: &str) -> Result<Url>;

    /// Exchanges an authorization code for verified identity claims.
    async fn exchange_code(&self, code: &str) -> Result<AzureClaims>;
}

/// Storage for in-flight CSRF state (short TTL).
#[async_trait]
pub trait AuthFlowRepository: Send + Sync {
    /// Stores flow state under the CSRF `state` value.
    async fn store_auth_flow(&self, state: &str, flow: &AuthFlowState) -> Result<()>;

    /// Retrieves and deletes flow state. A second take returns `None`.
    async fn take_auth_flow(&self, state: &str) -> Result<Option<AuthFlowState>>;
}

//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;

use plotdeck_core::auth::{AccountLinker, AuthFlowRepository, AzureProviderClient};
use plotdeck_core::storage::AccountRepository;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::providers::AzureProvider;
use crate::tokens::TokenIssuer;

/// Shared state for auth handlers.
#[derive(Clone)]
pub struct AuthState {
    pub accounts: Arc<dyn AccountRepository>,
    pub flows: Arc<dyn AuthFlowRepository>,
    pub config: AuthConfig,
    pub tokens: Arc<TokenIssuer>,
    azure: Option<Arc<dyn AzureProviderClient>>,
}

impl AuthState {
    /// Creates the state, initializing the Azure provider from config when
    /// the integration is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if OIDC discovery against the configured authority
    /// fails.
    pub async fn new(
        accounts: Arc<dyn AccountRepository>,
        flows: Arc<dyn AuthFlowRepository>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        let azure = match config.azure.as_ref() {
            Some(cfg) => {
                let provider = AzureProvider::new(cfg).await.map_err(AuthError::Core)?;
                Some(Arc::new(provider) as Arc<dyn AzureProviderClient>)
            }
            None => None,
        };

        Ok(Self::with_provider(accounts, flows, config, azure))
    }

    /// Creates the state with an explicit provider. Used by tests and by the
    /// mock-IdP development setup.
    pub fn with_provider(
        accounts: Arc<dyn AccountRepository>,
        flows: Arc<dyn AuthFlowRepository>,
        config: AuthConfig,
        azure: Option<Arc<dyn AzureProviderClient>>,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.encryption_key, config.token_ttl));
        Self {
            accounts,
            flows,
            config,
            tokens,
            azure,
        }
    }

    /// Whether the Azure integration is usable.
    pub fn is_enabled(&self) -> bool {
        self.azure.is_some()
    }

    /// The provider client, when configured.
    pub fn azure(&self) -> Option<&dyn AzureProviderClient> {
        self.azure.as_deref()
    }

    /// A linker over this state's account repository.
    pub fn linker(&self) -> AccountLinker {
        AccountLinker::new(self.accounts.clone())
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}

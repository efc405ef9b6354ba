//! In-memory account and flow storage for development and testing.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use plotdeck_core::account::User;
use plotdeck_core::auth::{AuthFlowRepository, AuthFlowState, Result as AuthResult};
use plotdeck_core::storage::{AccountRepository, RepositoryError, Result};

/// Hashes a password with Argon2id for storage in a `User`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RepositoryError::InvalidData(e.to_string()))
}

/// In-memory store implementing both the account repository and the auth
/// flow repository.
///
/// Enforces the same uniqueness the production store guarantees: one account
/// per email (case-insensitive) and per non-null azure_id. Data is lost when
/// the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    flows: Arc<RwLock<HashMap<String, AuthFlowState>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_azure_id(&self, azure_id: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.azure_id.as_deref() == Some(azure_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email_matches(email))
            .cloned())
    }

    async fn create_account(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email_matches(&user.email)) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "User",
                id: user.email.clone(),
            });
        }
        if let Some(azure_id) = user.azure_id.as_deref() {
            if users.values().any(|u| u.azure_id.as_deref() == Some(azure_id)) {
                return Err(RepositoryError::AlreadyExists {
                    entity_type: "User",
                    id: azure_id.to_string(),
                });
            }
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_account(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound {
                entity_type: "User",
                id: user.id.to_string(),
            });
        }
        if let Some(azure_id) = user.azure_id.as_deref() {
            if users
                .values()
                .any(|u| u.id != user.id && u.azure_id.as_deref() == Some(azure_id))
            {
                return Err(RepositoryError::AlreadyExists {
                    entity_type: "User",
                    id: azure_id.to_string(),
                });
            }
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let Some(hash) = user.password_hash.as_deref() else {
            return Ok(false);
        };

        let parsed =
            PasswordHash::new(hash).map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[async_trait]
impl AuthFlowRepository for InMemoryAccountStore {
    async fn store_auth_flow(&self, state: &str, flow: &AuthFlowState) -> AuthResult<()> {
        self.flows
            .write()
            .await
            .insert(state.to_string(), flow.clone());
        Ok(())
    }

    async fn take_auth_flow(&self, state: &str) -> AuthResult<Option<AuthFlowState>> {
        Ok(self.flows.write().await.remove(state))
    }
}

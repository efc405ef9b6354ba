use async_trait::async_trait;
use uuid::Uuid;

use crate::account::User;

use super::Result;

/// Repository for user account operations.
///
/// The store is expected to enforce uniqueness of `email` and of non-null
/// `azure_id`, returning `RepositoryError::AlreadyExists` when a write would
/// violate either. The linking logic relies on this to resolve races between
/// concurrent callbacks.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Gets an account by its ID.
    async fn get_account(&self, id: Uuid) -> Result<Option<User>>;

    /// Finds the account holding the given Azure object identifier.
    async fn find_by_azure_id(&self, azure_id: &str) -> Result<Option<User>>;

    /// Finds an account by email. Comparison is case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Creates a new account.
    async fn create_account(&self, user: &User) -> Result<()>;

    /// Updates an existing account.
    async fn update_account(&self, user: &User) -> Result<()>;

    /// Verifies a plaintext password against the account's stored credential.
    /// Returns `false` when no credential is stored.
    async fn verify_password(&self, user: &User, password: &str) -> Result<bool>;
}

//! Account-linking decision logic for the Azure AD callback.

use std::sync::Arc;

use chrono::Utc;

use crate::account::{AuthMethod, User};
use crate::storage::AccountRepository;

use super::{display_name, initials_icon, AuthError, AzureClaims, LinkOutcome, Result};

/// Resolves a verified Azure identity to a local account.
///
/// Three flows, all driven by the same repository seam:
/// - [`resolve_or_create`](Self::resolve_or_create) for the login callback
/// - [`link_to_account`](Self::link_to_account) for an authenticated user
///   attaching Azure to their existing account
/// - [`unlink`](Self::unlink) for detaching it again
pub struct AccountLinker {
    accounts: Arc<dyn AccountRepository>,
}

impl AccountLinker {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Login/callback flow: match by azure_id, then by email, then create.
    ///
    /// # Errors
    ///
    /// - `Validation` if the identity carries no email
    /// - `Conflict` if the matching email account is already linked to a
    ///   different Azure identity
    /// - `Storage` on repository failure
    pub async fn resolve_or_create(&self, claims: &AzureClaims) -> Result<(User, LinkOutcome)> {
        let email = claims
            .email
            .as_deref()
            .ok_or_else(|| AuthError::Validation("no email returned from Azure AD".to_string()))?;

        // Known Azure identity: plain login.
        if let Some(mut user) = self.accounts.find_by_azure_id(&claims.subject).await? {
            user.last_login = Some(Utc::now());
            self.accounts.update_account(&user).await?;
            return Ok((user, LinkOutcome::LoggedIn));
        }

        // Same email, existing account: link, unless another Azure identity
        // already claimed it.
        if let Some(mut user) = self.accounts.find_by_email(email).await? {
            if user.azure_id.as_deref().is_some_and(|id| id != claims.subject) {
                return Err(AuthError::Conflict(
                    "email already linked to a different Azure account".to_string(),
                ));
            }

            let now = Utc::now();
            user.azure_id = Some(claims.subject.clone());
            user.auth_method = if user.has_password() {
                AuthMethod::Hybrid
            } else {
                AuthMethod::Azure
            };
            user.azure_linked_at = Some(now);
            user.last_login = Some(now);
            self.accounts.update_account(&user).await?;
            return Ok((user, LinkOutcome::Linked));
        }

        // First sight of this identity: provision an Azure-only account.
        let name = display_name(claims);
        let mut user = User::new(&name, email)
            .with_icon(initials_icon(claims.name.as_deref()))
            .with_azure_id(&claims.subject)
            .as_active();
        user.last_login = Some(Utc::now());
        self.accounts.create_account(&user).await?;
        Ok((user, LinkOutcome::Created))
    }

    /// Explicit linking flow for an already-authenticated user.
    ///
    /// The identity's email must match the current account's email, and the
    /// Azure identity must not belong to anyone else.
    pub async fn link_to_account(&self, current: &User, claims: &AzureClaims) -> Result<User> {
        let email = claims
            .email
            .as_deref()
            .ok_or_else(|| AuthError::Validation("no email returned from Azure AD".to_string()))?;

        if !current.email_matches(email) {
            return Err(AuthError::Validation(
                "Azure account email does not match your account email".to_string(),
            ));
        }

        if let Some(existing) = self.accounts.find_by_azure_id(&claims.subject).await? {
            if existing.id != current.id {
                return Err(AuthError::Conflict(
                    "this Azure account is already linked to another user".to_string(),
                ));
            }
        }

        let mut user = current.clone();
        user.azure_id = Some(claims.subject.clone());
        user.auth_method = AuthMethod::Hybrid;
        user.azure_linked_at = Some(Utc::now());
        self.accounts.update_account(&user).await?;
        Ok(user)
    }

    /// Unlink flow, guarded by password re-verification.
    ///
    /// Azure-only accounts are refused outright: clearing their azure_id
    /// would leave them with no way to sign in.
    pub async fn unlink(&self, current: &User, password: Option<&str>) -> Result<User> {
        if current.azure_id.is_none() {
            return Err(AuthError::Validation(
                "no Azure account linked to this user".to_string(),
            ));
        }

        if current.auth_method == AuthMethod::Azure || !current.has_password() {
            return Err(AuthError::Validation(
                "cannot unlink: Azure is the only authentication method".to_string(),
            ));
        }

        let password = password.ok_or_else(|| {
            AuthError::Validation("password verification required".to_string())
        })?;

        if !self.accounts.verify_password(current, password).await? {
            return Err(AuthError::InvalidPassword);
        }

        let mut user = current.clone();
        user.azure_id = None;
        user.auth_method = AuthMethod::Local;
        user.azure_linked_at = None;
        self.accounts.update_account(&user).await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    use crate::storage::{RepositoryError, Result as StoreResult};

    use super::*;

    /// Test repository: a HashMap of users keyed by id, with a plaintext
    /// password map standing in for hashing.
    #[derive(Default)]
    struct FakeAccounts {
        users: RwLock<HashMap<Uuid, User>>,
        passwords: RwLock<HashMap<Uuid, String>>,
    }

    impl FakeAccounts {
        async fn insert(&self, user: User) {
            self.users.write().await.insert(user.id, user);
        }

        async fn set_password(&self, id: Uuid, password: &str) {
            self.passwords.write().await.insert(id, password.to_string());
        }

        async fn count(&self) -> usize {
            self.users.read().await.len()
        }

        async fn get(&self, id: Uuid) -> Option<User> {
            self.users.read().await.get(&id).cloned()
        }
    }

    #[async_trait]
    impl AccountRepository for FakeAccounts {
        async fn get_account(&self, id: Uuid) -> StoreResult<Option<User>> {
            Ok(self.users.read().await.get(&id).cloned())
        }

        async fn find_by_azure_id(&self, azure_id: &str) -> StoreResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.azure_id.as_deref() == Some(azure_id))
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.email_matches(email))
                .cloned())
        }

        async fn create_account(&self, user: &User) -> StoreResult<()> {
            let mut users = self.users.write().await;
            if users.values().any(|u| u.email_matches(&user.email)) {
                return Err(RepositoryError::AlreadyExists {
                    entity_type: "User",
                    id: user.email.clone(),
                });
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn update_account(&self, user: &User) -> StoreResult<()> {
            self.users.write().await.insert(user.id, user.clone());
            Ok(())
        }

        async fn verify_password(&self, user: &User, password: &str) -> StoreResult<bool> {
            Ok(self
                .passwords
                .read()
                .await
                .get(&user.id)
                .is_some_and(|p| p == password))
        }
    }

    fn claims(subject: &str, email: Option<&str>, name: Option<&str>) -> AzureClaims {
        AzureClaims {
            subject: subject.to_string(),
            email: email.map(String::from),
            name: name.map(String::from),
        }
    }

    fn linker(accounts: &Arc<FakeAccounts>) -> AccountLinker {
        AccountLinker::new(accounts.clone() as Arc<dyn AccountRepository>)
    }

    #[tokio::test]
    async fn missing_email_fails_without_mutation() {
        let accounts = Arc::new(FakeAccounts::default());
        let result = linker(&accounts)
            .resolve_or_create(&claims("abc", None, Some("Ada")))
            .await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
        assert_eq!(accounts.count().await, 0);
    }

    #[tokio::test]
    async fn empty_store_creates_azure_account() {
        let accounts = Arc::new(FakeAccounts::default());
        let (user, outcome) = linker(&accounts)
            .resolve_or_create(&claims("abc", Some("a@x.com"), Some("Ada Lovelace")))
            .await
            .unwrap();

        assert_eq!(outcome, LinkOutcome::Created);
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.icon, "AD");
        assert_eq!(user.auth_method, AuthMethod::Azure);
        assert!(user.active);
        assert!(!user.has_password());
        assert_eq!(accounts.count().await, 1);
    }

    #[tokio::test]
    async fn replayed_identity_logs_in_without_duplicate() {
        let accounts = Arc::new(FakeAccounts::default());
        let linker = linker(&accounts);
        let identity = claims("abc", Some("a@x.com"), Some("Ada Lovelace"));

        let (first, _) = linker.resolve_or_create(&identity).await.unwrap();
        let (second, outcome) = linker.resolve_or_create(&identity).await.unwrap();

        assert_eq!(outcome, LinkOutcome::LoggedIn);
        assert_eq!(first.id, second.id);
        assert_eq!(accounts.count().await, 1);
    }

    #[tokio::test]
    async fn matching_azure_id_updates_only_last_login() {
        let accounts = Arc::new(FakeAccounts::default());
        let existing = User::new("Ada", "a@x.com").with_azure_id("abc").as_active();
        let id = existing.id;
        accounts.insert(existing).await;

        let (user, outcome) = linker(&accounts)
            .resolve_or_create(&claims("abc", Some("other@x.com"), None))
            .await
            .unwrap();

        assert_eq!(outcome, LinkOutcome::LoggedIn);
        assert_eq!(user.id, id);
        assert_eq!(user.email, "a@x.com");
        assert!(user.last_login.is_some());
        assert_eq!(user.auth_method, AuthMethod::Azure);
    }

    #[tokio::test]
    async fn email_taken_by_other_azure_identity_conflicts() {
        let accounts = Arc::new(FakeAccounts::default());
        let existing = User::new("Ada", "a@x.com").with_azure_id("other-oid");
        let id = existing.id;
        accounts.insert(existing).await;

        let result = linker(&accounts)
            .resolve_or_create(&claims("abc", Some("a@x.com"), None))
            .await;

        assert!(matches!(result, Err(AuthError::Conflict(_))));
        // No mutation happened.
        let untouched = accounts.get(id).await.unwrap();
        assert_eq!(untouched.azure_id.as_deref(), Some("other-oid"));
        assert!(untouched.last_login.is_none());
    }

    #[tokio::test]
    async fn email_match_with_password_links_as_hybrid() {
        let accounts = Arc::new(FakeAccounts::default());
        let existing = User::new("Ada", "A@X.com").with_password_hash("$hash");
        accounts.insert(existing).await;

        let (user, outcome) = linker(&accounts)
            .resolve_or_create(&claims("abc", Some("a@x.com"), None))
            .await
            .unwrap();

        assert_eq!(outcome, LinkOutcome::Linked);
        assert_eq!(user.auth_method, AuthMethod::Hybrid);
        assert_eq!(user.azure_id.as_deref(), Some("abc"));
        assert!(user.azure_linked_at.is_some());
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn passwordless_email_match_links_as_azure() {
        let accounts = Arc::new(FakeAccounts::default());
        accounts.insert(User::new("Ada", "a@x.com")).await;

        let (user, outcome) = linker(&accounts)
            .resolve_or_create(&claims("abc", Some("a@x.com"), None))
            .await
            .unwrap();

        assert_eq!(outcome, LinkOutcome::Linked);
        assert_eq!(user.auth_method, AuthMethod::Azure);
    }

    #[tokio::test]
    async fn nameless_identity_gets_placeholder_icon_and_email_name() {
        let accounts = Arc::new(FakeAccounts::default());
        let (user, _) = linker(&accounts)
            .resolve_or_create(&claims("abc", Some("a@x.com"), None))
            .await
            .unwrap();

        assert_eq!(user.name, "a@x.com");
        assert_eq!(user.icon, "AZ");
    }

    #[tokio::test]
    async fn link_requires_matching_email() {
        let accounts = Arc::new(FakeAccounts::default());
        let current = User::new("Ada", "a@x.com").with_password_hash("$hash");
        accounts.insert(current.clone()).await;

        let result = linker(&accounts)
            .link_to_account(&current, &claims("abc", Some("other@x.com"), None))
            .await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn link_refuses_identity_held_by_another_user() {
        let accounts = Arc::new(FakeAccounts::default());
        let other = User::new("Eve", "eve@x.com").with_azure_id("abc");
        accounts.insert(other).await;
        let current = User::new("Ada", "a@x.com").with_password_hash("$hash");
        accounts.insert(current.clone()).await;

        let result = linker(&accounts)
            .link_to_account(&current, &claims("abc", Some("a@x.com"), None))
            .await;

        assert!(matches!(result, Err(AuthError::Conflict(_))));
    }

    #[tokio::test]
    async fn link_sets_hybrid_and_is_email_case_insensitive() {
        let accounts = Arc::new(FakeAccounts::default());
        let current = User::new("Ada", "Ada@X.com").with_password_hash("$hash");
        accounts.insert(current.clone()).await;

        let user = linker(&accounts)
            .link_to_account(&current, &claims("abc", Some("ada@x.com"), None))
            .await
            .unwrap();

        assert_eq!(user.auth_method, AuthMethod::Hybrid);
        assert_eq!(user.azure_id.as_deref(), Some("abc"));
        assert!(user.azure_linked_at.is_some());
    }

    #[tokio::test]
    async fn relink_same_identity_to_same_user_is_allowed() {
        let accounts = Arc::new(FakeAccounts::default());
        let current = User::new("Ada", "a@x.com")
            .with_password_hash("$hash")
            .with_azure_id("abc");
        accounts.insert(current.clone()).await;

        let user = linker(&accounts)
            .link_to_account(&current, &claims("abc", Some("a@x.com"), None))
            .await
            .unwrap();
        assert_eq!(user.azure_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn unlink_with_nothing_linked_fails() {
        let accounts = Arc::new(FakeAccounts::default());
        let current = User::new("Ada", "a@x.com").with_password_hash("$hash");

        let result = linker(&accounts).unlink(&current, Some("pw")).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn unlink_azure_only_account_always_fails() {
        let accounts = Arc::new(FakeAccounts::default());
        let current = User::new("Ada", "a@x.com").with_azure_id("abc");
        accounts.insert(current.clone()).await;
        accounts.set_password(current.id, "pw").await;

        let result = linker(&accounts).unlink(&current, Some("pw")).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn unlink_without_password_fails() {
        let accounts = Arc::new(FakeAccounts::default());
        let mut current = User::new("Ada", "a@x.com")
            .with_password_hash("$hash")
            .with_azure_id("abc");
        current.auth_method = AuthMethod::Hybrid;

        let result = linker(&accounts).unlink(&current, None).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn unlink_with_wrong_password_fails_without_mutation() {
        let accounts = Arc::new(FakeAccounts::default());
        let mut current = User::new("Ada", "a@x.com")
            .with_password_hash("$hash")
            .with_azure_id("abc");
        current.auth_method = AuthMethod::Hybrid;
        accounts.insert(current.clone()).await;
        accounts.set_password(current.id, "right").await;

        let result = linker(&accounts).unlink(&current, Some("wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidPassword)));

        let untouched = accounts.get(current.id).await.unwrap();
        assert_eq!(untouched.azure_id.as_deref(), Some("abc"));
        assert_eq!(untouched.auth_method, AuthMethod::Hybrid);
    }

    #[tokio::test]
    async fn unlink_with_correct_password_resets_to_local() {
        let accounts = Arc::new(FakeAccounts::default());
        let mut current = User::new("Ada", "a@x.com")
            .with_password_hash("$hash")
            .with_azure_id("abc");
        current.auth_method = AuthMethod::Hybrid;
        accounts.insert(current.clone()).await;
        accounts.set_password(current.id, "right").await;

        let user = linker(&accounts).unlink(&current, Some("right")).await.unwrap();

        assert!(user.azure_id.is_none());
        assert_eq!(user.auth_method, AuthMethod::Local);
        assert!(user.azure_linked_at.is_none());
        assert!(user.has_password());
    }
}

//! Credential store: identities, roles and permissions.
//!
//! Two backends share the `CredentialStore` contract: `MemoryStore` for
//! single-process deployments and tests, `SqliteStore` for persistence.
//! Reads are concurrent; writes to one identity are serialized by the
//! backend (shard locks or a transaction).

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::auth::AuthError;
use crate::models::auth::{Identity, NewIdentity, Permission, Role, StoredCredentials};

/// Persistence collaborator for identities and the RBAC catalog.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Identity and stored hashes for `client_id`, active or not.
    async fn find_credentials(&self, client_id: &str)
    -> Result<Option<StoredCredentials>, AuthError>;

    /// Identity for `client_id`, active or not.
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Identity>, AuthError> {
        Ok(self.find_credentials(client_id).await?.map(|c| c.identity))
    }

    /// Identity for `client_id` only if it is active.
    async fn find_active_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .find_by_client_id(client_id)
            .await?
            .filter(|identity| identity.is_active))
    }

    /// All identities, oldest first.
    async fn list_identities(&self) -> Result<Vec<Identity>, AuthError>;

    /// Create an identity. Username, email and client id must be unused and
    /// every role must exist.
    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, AuthError>;

    async fn set_active(&self, client_id: &str, active: bool) -> Result<Identity, AuthError>;

    async fn set_client_secret_hash(&self, client_id: &str, hash: &str) -> Result<(), AuthError>;

    async fn set_password_hash(&self, client_id: &str, hash: &str) -> Result<(), AuthError>;

    /// Assign an existing role. Assigning a role already held is a no-op.
    async fn assign_role(&self, client_id: &str, role: &str) -> Result<Identity, AuthError>;

    /// Remove a role. Removing a role not held is a no-op.
    async fn remove_role(&self, client_id: &str, role: &str) -> Result<Identity, AuthError>;

    /// All roles with their permissions, by name.
    async fn list_roles(&self) -> Result<Vec<Role>, AuthError>;

    /// All permissions, by name.
    async fn list_permissions(&self) -> Result<Vec<Permission>, AuthError>;

    /// Insert the default permission and role catalog. Idempotent.
    async fn seed_defaults(&self) -> Result<(), AuthError>;
}

pub(crate) fn identity_not_found(client_id: &str) -> AuthError {
    AuthError::NotFound(format!("identity '{client_id}'"))
}

pub(crate) fn role_not_found(role: &str) -> AuthError {
    AuthError::NotFound(format!("role '{role}'"))
}

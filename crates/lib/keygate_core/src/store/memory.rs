//! In-memory credential store backed by `DashMap`.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{CredentialStore, identity_not_found, role_not_found};
use crate::auth::AuthError;
use crate::models::auth::{Identity, NewIdentity, Permission, Role, StoredCredentials};
use crate::rbac;
use crate::uuid::uuidv7;

#[derive(Debug, Clone)]
struct IdentityRecord {
    id: Uuid,
    username: String,
    email: String,
    client_id: String,
    client_secret_hash: Option<String>,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    roles: BTreeSet<String>,
}

/// `DashMap` store keyed by client id. Each identity lives in one shard, so
/// writes to it are serialized while other identities stay readable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: DashMap<String, IdentityRecord>,
    roles: DashMap<String, Role>,
    /// Held while checking uniqueness and inserting a new identity.
    create_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the default role and permission catalog already loaded.
    pub fn seeded() -> Self {
        let store = Self::new();
        store.seed_catalog();
        store
    }

    fn seed_catalog(&self) {
        for role in rbac::default_roles() {
            self.roles.insert(role.name.clone(), role);
        }
    }

    fn load(&self, record: &IdentityRecord) -> Identity {
        let roles = record
            .roles
            .iter()
            .filter_map(|name| self.roles.get(name).map(|r| r.value().clone()))
            .collect();
        Identity {
            id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
            client_id: record.client_id.clone(),
            is_active: record.is_active,
            created_at: record.created_at,
            roles,
        }
    }

    /// Apply `f` to the identity under its shard lock, then load it.
    fn update<F>(&self, client_id: &str, f: F) -> Result<Identity, AuthError>
    where
        F: FnOnce(&mut IdentityRecord),
    {
        let record = {
            let mut entry = self
                .identities
                .get_mut(client_id)
                .ok_or_else(|| identity_not_found(client_id))?;
            f(entry.value_mut());
            entry.value().clone()
        };
        Ok(self.load(&record))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credentials(
        &self,
        client_id: &str,
    ) -> Result<Option<StoredCredentials>, AuthError> {
        let record = match self.identities.get(client_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        Ok(Some(StoredCredentials {
            identity: self.load(&record),
            client_secret_hash: record.client_secret_hash,
            password_hash: record.password_hash,
        }))
    }

    async fn list_identities(&self) -> Result<Vec<Identity>, AuthError> {
        let records: Vec<IdentityRecord> =
            self.identities.iter().map(|e| e.value().clone()).collect();
        let mut identities: Vec<Identity> = records.iter().map(|r| self.load(r)).collect();
        identities.sort_by_key(|i| i.id);
        Ok(identities)
    }

    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, AuthError> {
        if let Some(missing) = new.roles.iter().find(|r| !self.roles.contains_key(*r)) {
            return Err(role_not_found(missing));
        }

        let _guard = self
            .create_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let taken = self.identities.contains_key(&new.client_id)
            || self.identities.iter().any(|e| {
                let r = e.value();
                r.username == new.username || r.email == new.email
            });
        if taken {
            return Err(AuthError::ValidationError(
                "username, email or client id already registered".into(),
            ));
        }

        let record = IdentityRecord {
            id: uuidv7(),
            username: new.username,
            email: new.email,
            client_id: new.client_id.clone(),
            client_secret_hash: new.client_secret_hash,
            password_hash: new.password_hash,
            is_active: true,
            created_at: Utc::now(),
            roles: new.roles.into_iter().collect(),
        };
        let identity = self.load(&record);
        self.identities.insert(new.client_id, record);
        debug!(client_id = %identity.client_id, "identity created");
        Ok(identity)
    }

    async fn set_active(&self, client_id: &str, active: bool) -> Result<Identity, AuthError> {
        self.update(client_id, |r| r.is_active = active)
    }

    async fn set_client_secret_hash(&self, client_id: &str, hash: &str) -> Result<(), AuthError> {
        self.update(client_id, |r| r.client_secret_hash = Some(hash.to_string()))
            .map(|_| ())
    }

    async fn set_password_hash(&self, client_id: &str, hash: &str) -> Result<(), AuthError> {
        self.update(client_id, |r| r.password_hash = hash.to_string())
            .map(|_| ())
    }

    async fn assign_role(&self, client_id: &str, role: &str) -> Result<Identity, AuthError> {
        if !self.roles.contains_key(role) {
            return Err(role_not_found(role));
        }
        self.update(client_id, |r| {
            r.roles.insert(role.to_string());
        })
    }

    async fn remove_role(&self, client_id: &str, role: &str) -> Result<Identity, AuthError> {
        self.update(client_id, |r| {
            r.roles.remove(role);
        })
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AuthError> {
        let mut roles: Vec<Role> = self.roles.iter().map(|e| e.value().clone()).collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AuthError> {
        let mut permissions: Vec<Permission> = self
            .roles
            .iter()
            .flat_map(|e| e.value().permissions.clone())
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        permissions.dedup_by(|a, b| a.name == b.name);
        Ok(permissions)
    }

    async fn seed_defaults(&self) -> Result<(), AuthError> {
        self.seed_catalog();
        Ok(())
    }
}

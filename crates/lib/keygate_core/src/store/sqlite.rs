//! SQLite-backed credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteQueryResult;
use tracing::{debug, info};
use uuid::Uuid;

use super::{CredentialStore, identity_not_found, role_not_found};
use crate::auth::AuthError;
use crate::models::auth::{Identity, NewIdentity, Permission, Role, StoredCredentials};
use crate::rbac;
use crate::uuid::uuidv7;

type IdentityRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    bool,
    DateTime<Utc>,
);

const IDENTITY_COLUMNS: &str = "id, username, email, client_id, client_secret_hash, \
     password_hash, is_active, created_at";

/// Credential store over a `SqlitePool`. Run `crate::migrate::migrate`
/// before use.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_row(&self, client_id: &str) -> Result<Option<IdentityRow>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE client_id = ?"
        ))
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn role_permissions(&self, role: &str) -> Result<Vec<Permission>, AuthError> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<String>)>(
            "SELECT p.name, p.resource, p.action, p.description \
             FROM role_permissions rp \
             JOIN permissions p ON p.name = rp.permission_name \
             WHERE rp.role_name = ? \
             ORDER BY p.name",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(name, resource, action, description)| Permission {
                name,
                resource,
                action,
                description,
            })
            .collect())
    }

    async fn identity_roles(&self, identity_id: &str) -> Result<Vec<Role>, AuthError> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT r.name, r.description \
             FROM identity_roles ir \
             JOIN roles r ON r.name = ir.role_name \
             WHERE ir.identity_id = ? \
             ORDER BY r.name",
        )
        .bind(identity_id)
        .fetch_all(&self.pool)
        .await?;
        let mut roles = Vec::with_capacity(rows.len());
        for (name, description) in rows {
            let permissions = self.role_permissions(&name).await?;
            roles.push(Role {
                name,
                description,
                permissions,
            });
        }
        Ok(roles)
    }

    async fn load(&self, row: IdentityRow) -> Result<StoredCredentials, AuthError> {
        let (id, username, email, client_id, client_secret_hash, password_hash, is_active, created_at) =
            row;
        let roles = self.identity_roles(&id).await?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| AuthError::Internal(format!("stored identity id: {e}")))?;
        Ok(StoredCredentials {
            identity: Identity {
                id,
                username,
                email,
                client_id,
                is_active,
                created_at,
                roles,
            },
            client_secret_hash,
            password_hash,
        })
    }

    async fn require_identity(&self, client_id: &str) -> Result<Identity, AuthError> {
        self.find_by_client_id(client_id)
            .await?
            .ok_or_else(|| identity_not_found(client_id))
    }

    async fn role_exists(&self, role: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE name = ?)")
                .bind(role)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

/// Map "no row updated" to `NotFound`.
fn ensure_updated(result: SqliteQueryResult, client_id: &str) -> Result<(), AuthError> {
    if result.rows_affected() == 0 {
        return Err(identity_not_found(client_id));
    }
    Ok(())
}

fn map_unique_violation(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::ValidationError(
            "username, email or client id already registered".into(),
        ),
        _ => AuthError::DbError(e),
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn find_credentials(
        &self,
        client_id: &str,
    ) -> Result<Option<StoredCredentials>, AuthError> {
        match self.fetch_row(client_id).await? {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_identities(&self) -> Result<Vec<Identity>, AuthError> {
        let rows = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        let mut identities = Vec::with_capacity(rows.len());
        for row in rows {
            identities.push(self.load(row).await?.identity);
        }
        Ok(identities)
    }

    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, AuthError> {
        for role in &new.roles {
            if !self.role_exists(role).await? {
                return Err(role_not_found(role));
            }
        }

        let id = uuidv7().to_string();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO identities \
             (id, username, email, client_id, client_secret_hash, password_hash, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(&id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.client_id)
        .bind(&new.client_secret_hash)
        .bind(&new.password_hash)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        for role in &new.roles {
            sqlx::query("INSERT OR IGNORE INTO identity_roles (identity_id, role_name) VALUES (?, ?)")
                .bind(&id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(client_id = %new.client_id, "identity created");
        self.require_identity(&new.client_id).await
    }

    async fn set_active(&self, client_id: &str, active: bool) -> Result<Identity, AuthError> {
        let result = sqlx::query("UPDATE identities SET is_active = ? WHERE client_id = ?")
            .bind(active)
            .bind(client_id)
            .execute(&self.pool)
            .await?;
        ensure_updated(result, client_id)?;
        self.require_identity(client_id).await
    }

    async fn set_client_secret_hash(&self, client_id: &str, hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE identities SET client_secret_hash = ? WHERE client_id = ?")
            .bind(hash)
            .bind(client_id)
            .execute(&self.pool)
            .await?;
        ensure_updated(result, client_id)
    }

    async fn set_password_hash(&self, client_id: &str, hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE identities SET password_hash = ? WHERE client_id = ?")
            .bind(hash)
            .bind(client_id)
            .execute(&self.pool)
            .await?;
        ensure_updated(result, client_id)
    }

    async fn assign_role(&self, client_id: &str, role: &str) -> Result<Identity, AuthError> {
        if !self.role_exists(role).await? {
            return Err(role_not_found(role));
        }
        sqlx::query(
            "INSERT OR IGNORE INTO identity_roles (identity_id, role_name) \
             SELECT id, ? FROM identities WHERE client_id = ?",
        )
        .bind(role)
        .bind(client_id)
        .execute(&self.pool)
        .await?;
        // Zero rows means already assigned or no such identity; the reload tells them apart.
        self.require_identity(client_id).await
    }

    async fn remove_role(&self, client_id: &str, role: &str) -> Result<Identity, AuthError> {
        sqlx::query(
            "DELETE FROM identity_roles \
             WHERE role_name = ? \
               AND identity_id = (SELECT id FROM identities WHERE client_id = ?)",
        )
        .bind(role)
        .bind(client_id)
        .execute(&self.pool)
        .await?;
        self.require_identity(client_id).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AuthError> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT name, description FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut roles = Vec::with_capacity(rows.len());
        for (name, description) in rows {
            let permissions = self.role_permissions(&name).await?;
            roles.push(Role {
                name,
                description,
                permissions,
            });
        }
        Ok(roles)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AuthError> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<String>)>(
            "SELECT name, resource, action, description FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(name, resource, action, description)| Permission {
                name,
                resource,
                action,
                description,
            })
            .collect())
    }

    async fn seed_defaults(&self) -> Result<(), AuthError> {
        let mut tx = self.pool.begin().await?;
        for p in rbac::default_permissions() {
            sqlx::query(
                "INSERT OR IGNORE INTO permissions (name, resource, action, description) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&p.name)
            .bind(&p.resource)
            .bind(&p.action)
            .bind(&p.description)
            .execute(&mut *tx)
            .await?;
        }
        for role in rbac::default_roles() {
            sqlx::query("INSERT OR IGNORE INTO roles (name, description) VALUES (?, ?)")
                .bind(&role.name)
                .bind(&role.description)
                .execute(&mut *tx)
                .await?;
            for p in &role.permissions {
                sqlx::query(
                    "INSERT OR IGNORE INTO role_permissions (role_name, permission_name) \
                     VALUES (?, ?)",
                )
                .bind(&role.name)
                .bind(&p.name)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        info!("default roles and permissions seeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        crate::migrate::migrate(&pool).await.expect("migrate");
        let store = SqliteStore::new(pool);
        store.seed_defaults().await.expect("seed");
        store
    }

    fn new_identity(n: u32, roles: &[&str]) -> NewIdentity {
        NewIdentity {
            username: format!("user{n}"),
            email: format!("user{n}@example.com"),
            client_id: format!("client-{n}"),
            client_secret_hash: Some("hash".into()),
            password_hash: "pw-hash".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn seeded_catalog_matches_defaults() {
        let store = store().await;
        store.seed_defaults().await.unwrap();
        let roles = store.list_roles().await.unwrap();
        assert_eq!(
            roles.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["admin", "manager", "user"]
        );
        let manager = roles.iter().find(|r| r.name == "manager").unwrap();
        assert_eq!(manager.permissions.len(), 3);
        assert_eq!(store.list_permissions().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn create_and_load_with_roles() {
        let store = store().await;
        let created = store
            .create_identity(new_identity(1, &["user", "manager"]))
            .await
            .unwrap();
        assert_eq!(created.role_names(), vec!["manager", "user"]);
        assert!(created.is_active);

        let creds = store.find_credentials("client-1").await.unwrap().unwrap();
        assert_eq!(creds.identity, created);
        assert_eq!(creds.password_hash, "pw-hash");
    }

    #[tokio::test]
    async fn duplicate_client_id_is_a_validation_error() {
        let store = store().await;
        store.create_identity(new_identity(1, &[])).await.unwrap();
        let mut dup = new_identity(2, &[]);
        dup.client_id = "client-1".into();
        assert!(matches!(
            store.create_identity(dup).await,
            Err(AuthError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn activation_toggle_and_secret_rotation() {
        let store = store().await;
        store.create_identity(new_identity(1, &[])).await.unwrap();
        let identity = store.set_active("client-1", false).await.unwrap();
        assert!(!identity.is_active);
        assert!(
            store
                .find_active_by_client_id("client-1")
                .await
                .unwrap()
                .is_none()
        );

        store
            .set_client_secret_hash("client-1", "rotated")
            .await
            .unwrap();
        let creds = store.find_credentials("client-1").await.unwrap().unwrap();
        assert_eq!(creds.client_secret_hash.as_deref(), Some("rotated"));

        assert!(matches!(
            store.set_active("ghost", true).await,
            Err(AuthError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn role_assignment_round_trip() {
        let store = store().await;
        store.create_identity(new_identity(1, &["user"])).await.unwrap();
        let identity = store.assign_role("client-1", "admin").await.unwrap();
        assert!(rbac::has_permission(&identity, "users:delete"));
        let identity = store.remove_role("client-1", "admin").await.unwrap();
        assert!(!rbac::has_permission(&identity, "users:delete"));
        assert!(rbac::has_permission(&identity, "items:read"));
        assert!(matches!(
            store.assign_role("client-1", "root").await,
            Err(AuthError::NotFound(_))
        ));
        assert!(matches!(
            store.assign_role("ghost", "admin").await,
            Err(AuthError::NotFound(_))
        ));
    }
}

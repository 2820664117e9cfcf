//! Startup wiring: choose a credential store backend and provision the
//! bootstrap client.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use keygate_core::auth::AuthError;
use keygate_core::auth::credentials::{self, Registration};
use keygate_core::models::auth::Identity;
use keygate_core::rbac::ROLE_ADMIN;
use keygate_core::store::{CredentialStore, MemoryStore, SqliteStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::config::BootstrapClient;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Open the store for `database_url`: a migrated and seeded SQLite store,
/// or a seeded in-memory store when no URL is configured.
pub async fn open_store(
    database_url: Option<&str>,
    max_connections: u32,
) -> Result<Arc<dyn CredentialStore>, StartupError> {
    let Some(url) = database_url else {
        info!("no DATABASE_URL, using in-memory store");
        return Ok(Arc::new(MemoryStore::seeded()));
    };

    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    info!("running database migrations");
    keygate_core::migrate::migrate(&pool).await?;

    let store = SqliteStore::new(pool);
    store.seed_defaults().await?;
    Ok(Arc::new(store))
}

/// Make sure the bootstrap client exists and holds `admin`. An existing
/// client keeps its secret.
pub async fn ensure_bootstrap_client(
    store: &dyn CredentialStore,
    client: &BootstrapClient,
) -> Result<Identity, AuthError> {
    if store.find_by_client_id(&client.client_id).await?.is_some() {
        return store.assign_role(&client.client_id, ROLE_ADMIN).await;
    }
    let identity = credentials::register(
        store,
        Registration {
            username: client.client_id.clone(),
            email: format!("{}@keygate.local", client.client_id),
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            password: client.client_secret.clone(),
            roles: vec![ROLE_ADMIN.to_string()],
        },
    )
    .await?;
    info!(client_id = %identity.client_id, "bootstrap client created");
    Ok(identity)
}

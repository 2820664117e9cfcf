//! Client-credential authentication and identity registration.

use tracing::debug;

use super::AuthError;
use super::password::{dummy_hash, hash_secret, verify_secret};
use crate::models::auth::{Identity, NewIdentity};
use crate::store::CredentialStore;

/// Plaintext registration input; hashed before it reaches the store.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub client_id: String,
    pub client_secret: String,
    pub password: String,
    pub roles: Vec<String>,
}

/// Authenticate a client by id and secret.
///
/// Returns the identity only if it exists, is active, has a stored secret
/// and the secret matches. A bcrypt verification runs on every path, so a
/// miss costs the same as a wrong secret, and the caller cannot tell them
/// apart.
pub async fn authenticate(
    store: &dyn CredentialStore,
    client_id: &str,
    client_secret: &str,
) -> Result<Option<Identity>, AuthError> {
    let candidate = store
        .find_credentials(client_id)
        .await?
        .filter(|c| c.identity.is_active);

    let (identity, stored_hash) = match candidate {
        Some(c) => (Some(c.identity), c.client_secret_hash),
        None => (None, None),
    };

    let matches = verify_secret(client_secret, stored_hash.as_deref().unwrap_or(dummy_hash()))?;

    match identity {
        Some(identity) if matches && stored_hash.is_some() => Ok(Some(identity)),
        _ => {
            debug!(client_id, "client authentication failed");
            Ok(None)
        }
    }
}

/// Hash the secret and password and create the identity.
pub async fn register(
    store: &dyn CredentialStore,
    registration: Registration,
) -> Result<Identity, AuthError> {
    let missing: Vec<&str> = [
        ("username", registration.username.is_empty()),
        ("email", registration.email.is_empty()),
        ("client_id", registration.client_id.is_empty()),
        ("client_secret", registration.client_secret.is_empty()),
        ("password", registration.password.is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, empty)| empty.then_some(field))
    .collect();
    if !missing.is_empty() {
        return Err(AuthError::MissingFields(missing.join(", ")));
    }

    let new = NewIdentity {
        username: registration.username,
        email: registration.email,
        client_id: registration.client_id,
        client_secret_hash: Some(hash_secret(&registration.client_secret)?),
        password_hash: hash_secret(&registration.password)?,
        roles: registration.roles,
    };
    store.create_identity(new).await
}

/// Replace the client secret.
pub async fn rotate_client_secret(
    store: &dyn CredentialStore,
    client_id: &str,
    new_secret: &str,
) -> Result<(), AuthError> {
    let hash = hash_secret(new_secret)?;
    store.set_client_secret_hash(client_id, &hash).await
}

/// Replace the password.
pub async fn rotate_password(
    store: &dyn CredentialStore,
    client_id: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let hash = hash_secret(new_password)?;
    store.set_password_hash(client_id, &hash).await
}

/// Check a password for an active identity.
pub async fn verify_password(
    store: &dyn CredentialStore,
    client_id: &str,
    password: &str,
) -> Result<bool, AuthError> {
    let stored = store
        .find_credentials(client_id)
        .await?
        .filter(|c| c.identity.is_active)
        .map(|c| c.password_hash);
    let matches = verify_secret(password, stored.as_deref().unwrap_or(dummy_hash()))?;
    Ok(matches && stored.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registration(client_id: &str, secret: &str) -> Registration {
        Registration {
            username: format!("{client_id}-user"),
            email: format!("{client_id}@example.com"),
            client_id: client_id.into(),
            client_secret: secret.into(),
            password: "password123".into(),
            roles: vec!["user".into()],
        }
    }

    #[tokio::test]
    async fn active_identity_with_correct_secret_authenticates() {
        let store = MemoryStore::seeded();
        register(&store, registration("c1", "s3cret")).await.unwrap();
        let identity = authenticate(&store, "c1", "s3cret").await.unwrap();
        assert_eq!(identity.map(|i| i.client_id), Some("c1".to_string()));
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_client_look_the_same() {
        let store = MemoryStore::seeded();
        register(&store, registration("c1", "s3cret")).await.unwrap();
        assert!(authenticate(&store, "c1", "nope").await.unwrap().is_none());
        assert!(authenticate(&store, "ghost", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inactive_identity_fails_even_with_correct_secret() {
        let store = MemoryStore::seeded();
        register(&store, registration("c1", "s3cret")).await.unwrap();
        store.set_active("c1", false).await.unwrap();
        assert!(authenticate(&store, "c1", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn identity_without_secret_never_authenticates() {
        let store = MemoryStore::seeded();
        store
            .create_identity(NewIdentity {
                username: "nosecret".into(),
                email: "nosecret@example.com".into(),
                client_id: "c2".into(),
                client_secret_hash: None,
                password_hash: hash_secret("pw").unwrap(),
                roles: vec![],
            })
            .await
            .unwrap();
        assert!(
            authenticate(&store, "c2", "keygate-timing-equalizer")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn rotated_secret_replaces_old_one() {
        let store = MemoryStore::seeded();
        register(&store, registration("c1", "old")).await.unwrap();
        rotate_client_secret(&store, "c1", "new").await.unwrap();
        assert!(authenticate(&store, "c1", "old").await.unwrap().is_none());
        assert!(authenticate(&store, "c1", "new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn password_check_and_rotation() {
        let store = MemoryStore::seeded();
        register(&store, registration("c1", "s")).await.unwrap();
        assert!(verify_password(&store, "c1", "password123").await.unwrap());
        rotate_password(&store, "c1", "hunter22").await.unwrap();
        assert!(!verify_password(&store, "c1", "password123").await.unwrap());
        assert!(verify_password(&store, "c1", "hunter22").await.unwrap());
        assert!(!verify_password(&store, "ghost", "hunter22").await.unwrap());
    }

    #[tokio::test]
    async fn registration_reports_missing_fields() {
        let store = MemoryStore::seeded();
        let mut reg = registration("c1", "");
        reg.email.clear();
        match register(&store, reg).await {
            Err(AuthError::MissingFields(fields)) => assert_eq!(fields, "email, client_secret"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}

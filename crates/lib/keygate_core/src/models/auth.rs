//! Credential, RBAC and token domain models.
//!
//! `Identity` is the public view of a principal; password and secret hashes
//! only travel inside `StoredCredentials`, which never leaves the core.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A permission, named `resource:action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

impl Permission {
    /// Build a permission; the name is always derived from `(resource, action)`.
    pub fn new(resource: &str, action: &str, description: &str) -> Self {
        Self {
            name: format!("{resource}:{action}"),
            resource: resource.to_string(),
            action: action.to_string(),
            description: Some(description.to_string()),
        }
    }

    /// Split a `resource:action` name. Returns `None` unless both halves are non-empty.
    pub fn split_name(name: &str) -> Option<(&str, &str)> {
        let (resource, action) = name.split_once(':')?;
        if resource.is_empty() || action.is_empty() || action.contains(':') {
            return None;
        }
        Some((resource, action))
    }
}

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
}

/// Authenticated principal with its roles loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub client_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<Role>,
}

impl Identity {
    /// Names of the assigned roles.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }
}

/// Identity plus its stored hashes (for internal auth flows).
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub identity: Identity,
    pub client_secret_hash: Option<String>,
    pub password_hash: String,
}

/// Input for creating an identity. Hashes are computed by the caller.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub client_id: String,
    pub client_secret_hash: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Token type discriminator carried in every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Client identifier of the identity the token was issued to.
    pub client_id: String,
    pub token_type: TokenKind,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Freshly issued access + refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_name_derives_from_resource_and_action() {
        let p = Permission::new("items", "read", "Read items");
        assert_eq!(p.name, "items:read");
        assert_eq!(Permission::split_name(&p.name), Some(("items", "read")));
    }

    #[test]
    fn split_name_rejects_bad_shapes() {
        assert_eq!(Permission::split_name("items"), None);
        assert_eq!(Permission::split_name(":read"), None);
        assert_eq!(Permission::split_name("items:"), None);
        assert_eq!(Permission::split_name("a:b:c"), None);
    }

    #[test]
    fn token_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TokenKind::Refresh).unwrap();
        assert_eq!(json, "\"refresh\"");
        assert_eq!(TokenKind::Access.to_string(), "access");
    }
}

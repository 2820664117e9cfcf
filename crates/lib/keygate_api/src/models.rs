//! Wire models for the HTTP API.
//!
//! Distinct from the `keygate_core` domain models: field names follow the
//! OAuth2 token endpoint convention (snake_case) and hashes never appear.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use keygate_core::models::auth::{Identity, TokenPair};
use keygate_core::rbac;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `POST /oauth/token` body. All fields optional so absence is reported as
/// `missing_fields` rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

/// Identity summary embedded in token responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub username: String,
    pub client_id: String,
    pub roles: Vec<String>,
    pub permissions: BTreeSet<String>,
}

impl From<&Identity> for IdentitySummary {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            client_id: identity.client_id.clone(),
            roles: identity.role_names(),
            permissions: rbac::effective_permissions(identity),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
    pub user: IdentitySummary,
}

impl TokenResponse {
    pub fn new(identity: &Identity, pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
            refresh_expires_in: pair.refresh_expires_in,
            user: identity.into(),
        }
    }
}

/// Full identity view for `/me` and `/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub client_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<String>,
    pub permissions: BTreeSet<String>,
}

impl From<&Identity> for IdentityView {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            client_id: identity.client_id.clone(),
            is_active: identity.is_active,
            created_at: identity.created_at,
            roles: identity.role_names(),
            permissions: rbac::effective_permissions(identity),
        }
    }
}

/// `POST /users` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// `PUT /users/{client_id}/active` body.
#[derive(Debug, Clone, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// `POST /users/{client_id}/roles` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

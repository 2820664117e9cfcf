//! Token codec: HS256 JWT encoding and verification of `TokenClaims`.
//!
//! Expiry is checked against the injected `Clock` rather than by
//! `jsonwebtoken`, so there is no leeway and tests can move time.
//! The signing key is not versioned; changing it invalidates every token
//! issued under the old key.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{debug, info};

use super::AuthError;
use crate::clock::Clock;
use crate::models::auth::{TokenClaims, TokenKind};

/// Access token lifetime: 5 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 5 * 60;

/// Refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signing key and token lifetimes, fixed for the life of the process.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Config with the default lifetimes.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Encodes and decodes signed, time-bounded claims.
#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
            validation,
            clock,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Claims for a token of `kind` issued now.
    pub fn claims_for(&self, client_id: &str, kind: TokenKind) -> TokenClaims {
        let iat = self.clock.now().timestamp();
        TokenClaims {
            client_id: client_id.to_string(),
            token_type: kind,
            iat,
            exp: iat + self.config.ttl(kind).num_seconds(),
        }
    }

    /// Sign `claims` into a token string.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify the signature, then the expiry.
    ///
    /// `Malformed` for anything that fails to verify or parse; `Expired`
    /// once `now >= exp`.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "token failed verification");
            AuthError::Malformed
        })?;
        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(AuthError::Expired);
        }
        Ok(data.claims)
    }
}

/// Resolve the JWT secret: `lookup_jwt_secret`, else generate one and
/// persist it for the next start.
pub fn resolve_jwt_secret() -> String {
    if let Some(secret) = lookup_jwt_secret() {
        return secret;
    }
    let secret_path = jwt_secret_path();
    let secret = generate_secret();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Existing JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted
/// file. Never creates one.
pub fn lookup_jwt_secret() -> Option<String> {
    ["JWT_SECRET", "AUTH_SECRET"]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|secret| !secret.is_empty())
        .or_else(|| {
            std::fs::read_to_string(jwt_secret_path())
                .ok()
                .map(|existing| existing.trim().to_string())
                .filter(|secret| !secret.is_empty())
        })
}

/// Random 64-character alphanumeric secret.
pub fn generate_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keygate")
        .join("jwt-secret")
}

//! Token lifecycle: issue pairs, validate access tokens, rotate refresh tokens.
//!
//! Tokens are `Issued → Valid (now < exp) → Expired`. There is no revoked
//! state: a refresh token used for rotation stays usable until it expires.

use std::sync::Arc;

use tracing::debug;

use super::AuthError;
use super::jwt::TokenCodec;
use crate::models::auth::{Identity, TokenClaims, TokenKind, TokenPair};
use crate::store::CredentialStore;

/// Issues and checks tokens against a credential store.
#[derive(Clone)]
pub struct TokenService {
    codec: TokenCodec,
    store: Arc<dyn CredentialStore>,
}

impl TokenService {
    pub fn new(codec: TokenCodec, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Encode an access and a refresh token for `client_id`.
    pub fn issue_token_pair(&self, client_id: &str) -> Result<TokenPair, AuthError> {
        let access = self.codec.claims_for(client_id, TokenKind::Access);
        let refresh = self.codec.claims_for(client_id, TokenKind::Refresh);
        let config = self.codec.config();
        Ok(TokenPair {
            access_token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
            expires_in: config.access_ttl.num_seconds(),
            refresh_expires_in: config.refresh_ttl.num_seconds(),
        })
    }

    /// Validate an access token and return its client id.
    pub async fn validate_access(&self, token: &str) -> Result<String, AuthError> {
        self.authorize_access(token)
            .await
            .map(|identity| identity.client_id)
    }

    /// Validate an access token and load the active identity behind it.
    ///
    /// Liveness is re-read from the store on every call; a token for an
    /// identity deactivated after issuance fails with
    /// `UnknownOrInactiveClient`.
    pub async fn authorize_access(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode_expecting(token, TokenKind::Access)?;
        self.live_identity(&claims).await
    }

    /// Exchange a refresh token for a brand-new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.rotate(refresh_token).await.map(|(_, pair)| pair)
    }

    /// Like `refresh`, also returning the identity the pair was issued to.
    ///
    /// The presented refresh token is not invalidated.
    pub async fn rotate(&self, refresh_token: &str) -> Result<(Identity, TokenPair), AuthError> {
        let claims = self.decode_expecting(refresh_token, TokenKind::Refresh)?;
        let identity = self.live_identity(&claims).await?;
        let pair = self.issue_token_pair(&identity.client_id)?;
        debug!(client_id = %identity.client_id, "refresh token rotated");
        Ok((identity, pair))
    }

    fn decode_expecting(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AuthError> {
        let claims = self.codec.decode(token)?;
        if claims.token_type != expected {
            return Err(AuthError::WrongType {
                expected,
                found: claims.token_type,
            });
        }
        Ok(claims)
    }

    async fn live_identity(&self, claims: &TokenClaims) -> Result<Identity, AuthError> {
        self.store
            .find_active_by_client_id(&claims.client_id)
            .await?
            .ok_or(AuthError::UnknownOrInactiveClient)
    }
}

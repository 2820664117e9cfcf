//! Built-in access checks.

use async_trait::async_trait;

use super::{AccessCheck, AccessContext};
use crate::auth::AuthError;
use crate::auth::tokens::TokenService;
use crate::rbac;

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively. Anything other than exactly
/// one non-empty token after the scheme is `InvalidTokenFormat`.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidTokenFormat)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AuthError::InvalidTokenFormat);
    }
    Ok(token)
}

/// Authenticates the access token and attaches the identity.
pub struct BearerCheck {
    tokens: TokenService,
}

impl BearerCheck {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl AccessCheck for BearerCheck {
    async fn check(&self, mut ctx: AccessContext) -> Result<AccessContext, AuthError> {
        let header = ctx.authorization.as_deref().ok_or(AuthError::TokenMissing)?;
        let token = parse_bearer(header)?;
        let identity = self.tokens.authorize_access(token).await?;
        ctx.principal = Some(identity);
        Ok(ctx)
    }

    fn name(&self) -> &str {
        "BearerCheck"
    }
}

/// Rejects unless the principal holds a permission through one of its roles.
pub struct PermissionCheck {
    permission: String,
}

impl PermissionCheck {
    pub fn new(permission: &str) -> Self {
        Self {
            permission: permission.to_string(),
        }
    }
}

#[async_trait]
impl AccessCheck for PermissionCheck {
    async fn check(&self, ctx: AccessContext) -> Result<AccessContext, AuthError> {
        if !rbac::has_permission(ctx.principal()?, &self.permission) {
            return Err(AuthError::Forbidden(format!(
                "Permission denied. Required: {}",
                self.permission
            )));
        }
        Ok(ctx)
    }

    fn name(&self) -> &str {
        "PermissionCheck"
    }
}

/// Rejects unless the principal holds a role.
pub struct RoleCheck {
    role: String,
}

impl RoleCheck {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
        }
    }
}

#[async_trait]
impl AccessCheck for RoleCheck {
    async fn check(&self, ctx: AccessContext) -> Result<AccessContext, AuthError> {
        if !rbac::has_role(ctx.principal()?, &self.role) {
            return Err(AuthError::Forbidden(format!("Role required: {}", self.role)));
        }
        Ok(ctx)
    }

    fn name(&self) -> &str {
        "RoleCheck"
    }
}

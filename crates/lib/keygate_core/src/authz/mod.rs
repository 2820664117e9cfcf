//! Authorization pipeline.
//!
//! An ordered list of checks runs against an `AccessContext`. Each check
//! either hands back the (possibly enriched) context or short-circuits with
//! an error; later checks never run after a failure. The bearer check
//! resolves the identity, permission and role checks then read it.

pub mod checks;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

pub use checks::{BearerCheck, PermissionCheck, RoleCheck};

use crate::auth::AuthError;
use crate::auth::tokens::TokenService;
use crate::models::auth::Identity;

/// State threaded through the checks of one request.
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
    /// Raw `Authorization` header value, if any.
    pub authorization: Option<String>,
    /// Identity resolved by the bearer check.
    pub principal: Option<Identity>,
}

impl AccessContext {
    pub fn new(authorization: Option<&str>) -> Self {
        Self {
            authorization: authorization.map(str::to_string),
            principal: None,
        }
    }

    /// The resolved identity, or `TokenMissing` if nothing authenticated yet.
    pub fn principal(&self) -> Result<&Identity, AuthError> {
        self.principal.as_ref().ok_or(AuthError::TokenMissing)
    }
}

/// One step of the pipeline.
#[async_trait]
pub trait AccessCheck: Send + Sync {
    /// Inspect the context. Return it (possibly enriched) to proceed, or an
    /// error to reject the request.
    async fn check(&self, ctx: AccessContext) -> Result<AccessContext, AuthError>;

    /// Check identifier for logging.
    fn name(&self) -> &str;
}

/// Ordered list of checks.
#[derive(Clone, Default)]
pub struct AccessPipeline {
    checks: Vec<Arc<dyn AccessCheck>>,
}

impl AccessPipeline {
    pub fn new(checks: Vec<Arc<dyn AccessCheck>>) -> Self {
        Self { checks }
    }

    /// Pipeline starting with bearer-token authentication.
    pub fn authenticated(tokens: TokenService) -> Self {
        Self::new(vec![Arc::new(BearerCheck::new(tokens))])
    }

    /// Append a check.
    pub fn then(mut self, check: impl AccessCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    pub fn require_permission(self, permission: &str) -> Self {
        self.then(PermissionCheck::new(permission))
    }

    pub fn require_role(self, role: &str) -> Self {
        self.then(RoleCheck::new(role))
    }

    /// Run every check in order. Short-circuits on the first error.
    pub async fn run(&self, mut ctx: AccessContext) -> Result<AccessContext, AuthError> {
        for check in &self.checks {
            ctx = check.check(ctx).await.inspect_err(|e| {
                debug!(check = check.name(), error = %e, "access check rejected request");
            })?;
        }
        Ok(ctx)
    }

    /// Run the pipeline for an `Authorization` header and return the
    /// resolved identity.
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let ctx = self.run(AccessContext::new(authorization)).await?;
        ctx.principal.ok_or(AuthError::TokenMissing)
    }
}

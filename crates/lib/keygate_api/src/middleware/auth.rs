//! Authorization middleware. Runs an `AccessPipeline` in front of a route
//! and hands the resolved identity to the handler as `Principal`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::routing::MethodRouter;
use keygate_core::auth::AuthError;
use keygate_core::authz::AccessPipeline;
use keygate_core::models::auth::Identity;

use crate::AppState;
use crate::error::AppError;

/// Identity that passed the route's pipeline. Handlers take it as
/// `Extension<Principal>`.
#[derive(Debug, Clone)]
pub struct Principal(pub Identity);

/// Middleware state: the pipeline for one route.
#[derive(Clone)]
pub struct Guard {
    pipeline: Arc<AccessPipeline>,
}

/// Protect `route` with `pipeline`.
pub fn guarded(
    pipeline: AccessPipeline,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let guard = Guard {
        pipeline: Arc::new(pipeline),
    };
    route.route_layer(from_fn_with_state(guard, require_access))
}

/// Axum middleware: reads `Authorization`, runs the pipeline, and inserts
/// `Principal` into request extensions for the handler.
pub async fn require_access(
    State(guard): State<Guard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AuthError::InvalidTokenFormat)?
                .to_owned(),
        ),
        None => None,
    };

    let identity = guard.pipeline.authorize(authorization.as_deref()).await?;

    request.extensions_mut().insert(Principal(identity));
    Ok(next.run(request).await)
}

//! # keygate_api
//!
//! HTTP API library for Keygate.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use keygate_core::auth::jwt::TokenCodec;
use keygate_core::auth::tokens::TokenService;
use keygate_core::authz::AccessPipeline;
use keygate_core::clock::{Clock, SystemClock};
use keygate_core::items::ItemStore;
use keygate_core::rbac::ROLE_ADMIN;
use keygate_core::store::CredentialStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{health, items, token, users};
use crate::middleware::auth::guarded;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Identity, role and permission persistence.
    pub store: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    pub items: Arc<ItemStore>,
}

impl AppState {
    /// State using the wall clock.
    pub fn new(config: ApiConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ApiConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = TokenCodec::new(config.token_config(), clock);
        Self {
            tokens: TokenService::new(codec, store.clone()),
            store,
            items: Arc::new(ItemStore::new()),
            config,
        }
    }

    /// Pipeline that authenticates the bearer token.
    pub fn authenticated(&self) -> AccessPipeline {
        AccessPipeline::authenticated(self.tokens.clone())
    }

    pub fn permission(&self, permission: &str) -> AccessPipeline {
        self.authenticated().require_permission(permission)
    }

    pub fn role(&self, role: &str) -> AccessPipeline {
        self.authenticated().require_role(role)
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/", get(health::welcome_handler))
        .route("/health", get(health::health_handler))
        .route("/oauth/token", post(token::token_handler));

    let s = &state;
    let protected = Router::new()
        .route("/me", guarded(s.authenticated(), get(users::me_handler)))
        .route(
            "/items",
            guarded(s.permission("items:read"), get(items::list_items_handler))
                .merge(guarded(s.permission("items:write"), post(items::create_item_handler))),
        )
        .route(
            "/items/{id}",
            guarded(s.permission("items:read"), get(items::get_item_handler))
                .merge(guarded(s.permission("items:write"), put(items::replace_item_handler)))
                .merge(guarded(
                    s.permission("items:delete"),
                    delete(items::delete_item_handler),
                )),
        )
        .route(
            "/users",
            guarded(s.permission("users:read"), get(users::list_users_handler))
                .merge(guarded(s.permission("users:write"), post(users::create_user_handler))),
        )
        .route(
            "/users/{client_id}/active",
            guarded(s.permission("users:write"), put(users::set_active_handler)),
        )
        .route(
            "/users/{client_id}/roles",
            guarded(s.role(ROLE_ADMIN), post(users::assign_role_handler)),
        )
        .route(
            "/users/{client_id}/roles/{role}",
            guarded(s.role(ROLE_ADMIN), delete(users::remove_role_handler)),
        )
        .route("/roles", guarded(s.role(ROLE_ADMIN), get(users::list_roles_handler)));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

//! Shared harness: an in-memory router driven with `oneshot` and a manual
//! clock.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, TimeZone, Utc};
use keygate_api::{AppState, config::ApiConfig};
use keygate_core::auth::credentials::{self, Registration};
use keygate_core::clock::ManualClock;
use keygate_core::store::{CredentialStore, MemoryStore};
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn CredentialStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
        ));
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::seeded());
        let state = AppState::with_clock(
            ApiConfig::with_secret("integration-secret"),
            store.clone(),
            clock.clone(),
        );
        Self {
            app: keygate_api::router(state),
            clock,
            store,
        }
    }

    /// Register `client_id` with secret `<client_id>-secret` and `roles`.
    pub async fn client(&self, client_id: &str, roles: &[&str]) {
        credentials::register(
            self.store.as_ref(),
            Registration {
                username: format!("{client_id}-name"),
                email: format!("{client_id}@example.com"),
                client_id: client_id.into(),
                client_secret: format!("{client_id}-secret"),
                password: "password123".into(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            },
        )
        .await
        .expect("register client");
    }

    pub fn advance(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("request");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON")
        };
        (status, json)
    }

    /// Request with a bearer token.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let header = format!("Bearer {token}");
        self.request(method, uri, Some(&header), body).await
    }

    pub async fn token_request(&self, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, "/oauth/token", None, Some(body))
            .await
    }

    /// Client-credentials grant for a client made with [`TestApp::client`].
    pub async fn login(&self, client_id: &str) -> Value {
        let (status, body) = self
            .token_request(json!({
                "grant_type": "client_credentials",
                "client_id": client_id,
                "client_secret": format!("{client_id}-secret"),
            }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body
    }

    pub async fn access_token(&self, client_id: &str) -> String {
        self.login(client_id).await["access_token"]
            .as_str()
            .expect("access_token")
            .to_string()
    }
}

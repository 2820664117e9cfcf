//! Public liveness endpoints.

use axum::Json;

use crate::models::{HealthResponse, MessageResponse};

/// `GET /`: welcome message.
pub async fn welcome_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the Keygate API".to_string(),
    })
}

/// `GET /health`: process is up.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: keygate_core::version().to_string(),
    })
}

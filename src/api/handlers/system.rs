//! Liveness endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Local time used to reject reservations that start in the past.
    pub server_time: NaiveDateTime,
}

/// `GET /health`: Liveness and server clock.
///
/// Does not touch the store.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Reports the service version and the naive local time reservations are validated against.",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        server_time: state.reservations.now(),
    })
}

/// Routes mounted at the root, outside `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

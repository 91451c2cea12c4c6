//! Healthcheck endpoint.

use axum::{Router, routing::get};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Healthcheck payload.
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Liveness probe. No store round trip; a hung pool should not make the
/// process look dead.
async fn healthcheck() -> ApiResponse<Health> {
    ApiResponse::ok(Health { status: "ok" }, "Everything is OK")
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(healthcheck))
}

//! Liveness probe. Mounted at `/health` regardless of `API_PREFIX`.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::sensors::SENSORS;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sensors: usize,
}

/// Handle `GET /health`.
///
/// Reports liveness, the crate version and the number of registered sensors.
/// Does not touch the database.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sensors: SENSORS.len(),
    })
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}

//! Discovery endpoint listing the sensors this service accepts.

use axum::{http::StatusCode, routing::get, Router};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::sensors::{FieldSpec, SENSORS};
use crate::validation::{self, Operation};

// ---

#[derive(Debug, Serialize)]
struct SensorInfo {
    name: &'static str,
    table: &'static str,
    fields: &'static [FieldSpec],
    create_requires: Vec<&'static str>,
    update_requires: Vec<&'static str>,
    latest_by_token: bool,
}

/// Handle `GET /sensors`.
async fn list() -> ApiResponse<Vec<SensorInfo>> {
    // ---
    let sensors = SENSORS
        .iter()
        .map(|s| SensorInfo {
            name: s.name,
            table: s.table,
            fields: s.fields,
            create_requires: validation::required_fields(s, Operation::Create),
            update_requires: validation::required_fields(s, Operation::Update),
            latest_by_token: s.tracks_created_at,
        })
        .collect();

    ApiResponse::with_data(StatusCode::OK, "Daftar sensor", sensors)
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/sensors", get(list))
}

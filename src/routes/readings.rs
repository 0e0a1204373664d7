//! CRUD endpoints shared by every sensor.
//!
//! The first path segment selects the [`SensorSchema`]; the handlers bind
//! and validate the request, then hand over to [`ReadingService`].

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::repository::ReadingRepository;
use crate::response::{ApiResponse, ValidationResponse};
use crate::sensors::{self, SensorSchema};
use crate::service::ReadingService;
use crate::validation::{self, ValidationErrors};

// ---

pub fn router<R: ReadingRepository>() -> Router<R> {
    // ---
    Router::new()
        .route("/{sensor}/create", post(create::<R>))
        .route("/{sensor}/update/{id}", put(update::<R>))
        .route("/{sensor}/delete/{id}", delete(remove::<R>))
        .route("/{sensor}/get_all", get(get_all::<R>))
        .route("/{sensor}/detail", get(get_by_id::<R>))
        .route("/{sensor}/detail/token", get(get_by_token::<R>))
        .route("/{sensor}/detail/new/token", get(get_latest_by_token::<R>))
}

type HandlerResult = Result<Response, Response>;

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    device_token: Option<String>,
}

fn sensor_schema(name: &str) -> Result<&'static SensorSchema, Response> {
    // ---
    sensors::find(name).ok_or_else(|| {
        debug!("unknown sensor {:?}", name);
        ApiResponse::<()>::not_found(format!("Sensor tidak dikenal : {name}")).into_response()
    })
}

fn reject(errors: ValidationErrors) -> Response {
    debug!("rejected fields: {:?}", errors.fields().collect::<Vec<_>>());
    ValidationResponse::rejected(errors).into_response()
}

fn invalid_query(rejection: QueryRejection) -> Response {
    debug!("rejected query string: {}", rejection.body_text());
    ValidationResponse::invalid_query(rejection.body_text()).into_response()
}

fn invalid_body(rejection: JsonRejection) -> Response {
    debug!("rejected request body: {}", rejection.body_text());
    ValidationResponse::invalid_body(rejection.body_text()).into_response()
}

/// Handle `POST /{sensor}/create`.
async fn create<R: ReadingRepository>(
    State(repo): State<R>,
    Path(sensor): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> HandlerResult {
    // ---
    let schema = sensor_schema(&sensor)?;
    let Json(payload) = payload.map_err(invalid_body)?;
    let reading = validation::validate_create(schema, &payload).map_err(reject)?;

    Ok(ReadingService::new(&repo, schema)
        .create(reading)
        .await
        .into_response())
}

/// Handle `PUT /{sensor}/update/{id}`.
async fn update<R: ReadingRepository>(
    State(repo): State<R>,
    Path((sensor, id)): Path<(String, String)>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> HandlerResult {
    // ---
    let schema = sensor_schema(&sensor)?;
    let id = validation::parse_id(Some(id.as_str())).map_err(reject)?;
    let Json(payload) = payload.map_err(invalid_body)?;
    let measurements = validation::validate_update(schema, &payload).map_err(reject)?;

    Ok(ReadingService::new(&repo, schema)
        .update(id, measurements)
        .await
        .into_response())
}

/// Handle `DELETE /{sensor}/delete/{id}`.
async fn remove<R: ReadingRepository>(
    State(repo): State<R>,
    Path((sensor, id)): Path<(String, String)>,
) -> HandlerResult {
    // ---
    let schema = sensor_schema(&sensor)?;
    let id = validation::parse_id(Some(id.as_str())).map_err(reject)?;

    Ok(ReadingService::new(&repo, schema)
        .delete(id)
        .await
        .into_response())
}

/// Handle `GET /{sensor}/get_all`.
async fn get_all<R: ReadingRepository>(
    State(repo): State<R>,
    Path(sensor): Path<String>,
) -> HandlerResult {
    // ---
    let schema = sensor_schema(&sensor)?;
    Ok(ReadingService::new(&repo, schema).get_all().await.into_response())
}

/// Handle `GET /{sensor}/detail?id=`.
async fn get_by_id<R: ReadingRepository>(
    State(repo): State<R>,
    Path(sensor): Path<String>,
    params: Result<Query<IdQuery>, QueryRejection>,
) -> HandlerResult {
    // ---
    let schema = sensor_schema(&sensor)?;
    let Query(params) = params.map_err(invalid_query)?;
    let id = validation::parse_id(params.id.as_deref()).map_err(reject)?;

    Ok(ReadingService::new(&repo, schema)
        .get_by_id(id)
        .await
        .into_response())
}

/// Handle `GET /{sensor}/detail/token?device_token=`.
async fn get_by_token<R: ReadingRepository>(
    State(repo): State<R>,
    Path(sensor): Path<String>,
    params: Result<Query<TokenQuery>, QueryRejection>,
) -> HandlerResult {
    // ---
    let schema = sensor_schema(&sensor)?;
    let Query(params) = params.map_err(invalid_query)?;
    let device_token = validation::require_token(params.device_token.as_deref())
        .map_err(reject)?;

    Ok(ReadingService::new(&repo, schema)
        .get_by_token(device_token)
        .await
        .into_response())
}

/// Handle `GET /{sensor}/detail/new/token?device_token=`.
///
/// Only sensors that record creation time can answer this.
async fn get_latest_by_token<R: ReadingRepository>(
    State(repo): State<R>,
    Path(sensor): Path<String>,
    params: Result<Query<TokenQuery>, QueryRejection>,
) -> HandlerResult {
    // ---
    let schema = sensor_schema(&sensor)?;
    if !schema.tracks_created_at {
        return Err(ApiResponse::<()>::not_found(format!(
            "Sensor {} tidak mendukung pencarian data terbaru",
            schema.name
        ))
        .into_response());
    }
    let Query(params) = params.map_err(invalid_query)?;
    let device_token = validation::require_token(params.device_token.as_deref())
        .map_err(reject)?;

    Ok(ReadingService::new(&repo, schema)
        .get_latest_by_token(device_token)
        .await
        .into_response())
}

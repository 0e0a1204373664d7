use std::any::Any;

use axum::{response::IntoResponse, response::Response, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{ApiResponse, Config, ReadingRepository};

mod health;
mod readings;
mod sensors;

// ---

pub fn router<R: ReadingRepository>(repo: R, config: &Config) -> Router {
    // ---
    let api: Router<R> = readings::router().merge(sensors::router());
    let api = if config.api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(&config.api_prefix, api)
    };

    with_layers(api.merge(health::router()).with_state(repo))
}

/// Request tracing, and a 500 envelope instead of a dropped connection when a
/// handler panics.
fn with_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    // ---
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("Handler panicked: {}", detail);

    ApiResponse::<()>::internal_error("Terjadi kesalahan pada server").into_response()
}

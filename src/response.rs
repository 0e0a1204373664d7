//! Uniform JSON envelopes returned by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};

use crate::validation::ValidationErrors;

// ---

fn status_code<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

/// `{status, message, data}`; `data` is `null` when absent.
///
/// The transport status is always the envelope's `status`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    // ---
    #[serde(serialize_with = "status_code")]
    pub status: StatusCode,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    // ---
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_data(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_data(StatusCode::CREATED, message, data)
    }

    pub fn with_data(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn empty(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::empty(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::empty(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Payload of the `error` key in a [`ValidationResponse`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ValidationDetail {
    /// Field name → message.
    Fields(ValidationErrors),
    /// Body or query string could not be parsed at all.
    Unparsed(String),
}

/// `{status, message, error}` returned for rejected requests (always 400).
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    // ---
    #[serde(serialize_with = "status_code")]
    pub status: StatusCode,
    pub message: String,
    pub error: ValidationDetail,
}

impl ValidationResponse {
    // ---
    pub fn rejected(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Request di tolak".to_string(),
            error: ValidationDetail::Fields(errors),
        }
    }

    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid request body".to_string(),
            error: ValidationDetail::Unparsed(reason.into()),
        }
    }

    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid query parameters".to_string(),
            error: ValidationDetail::Unparsed(reason.into()),
        }
    }
}

impl IntoResponse for ValidationResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

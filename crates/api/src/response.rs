//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope, serialized as `{"data": ...}`.
///
/// Errors never pass through here; `AppError` renders its own
/// `{"error": {...}}` body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Empty object payload for operations with nothing to return.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// `{"data": {}}`.
#[must_use]
pub const fn empty() -> ApiResponse<Empty> {
    ApiResponse::ok(Empty {})
}

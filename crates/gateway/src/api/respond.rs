//! Uniform wire envelopes.
//!
//! Success: `{ "data": … }`. Failure: `{ "error": { "code", "message" } }`
//! with a non-2xx status. Handlers return `Result<_, ApiError>` and let `?`
//! carry domain errors to the mapping below.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use mn_domain::error::Error;

/// Build the standardized JSON error envelope.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

/// Map a domain error onto the wire taxonomy.
pub fn error_from(err: &Error) -> Response {
    let (status, code) = match err {
        Error::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        Error::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        Error::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
        Error::Upstream { .. } | Error::Http(_) => {
            (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE")
        }
        Error::Backend(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
        Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };
    error_response(status, code, &err.to_string())
}

/// Wrapper that lets handlers use `?` on domain results.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_from(&self.0)
    }
}

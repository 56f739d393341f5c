//! API authentication middleware.
//!
//! Every protected request carries `Authorization: Bearer <token>`, where
//! the token is an end-user credential issued by the hosted auth service.
//! The middleware exchanges it for a verified identity on every request —
//! nothing is cached — and inserts [`AuthedUser`] into request extensions
//! for handlers. Attach via `axum::middleware::from_fn_with_state`.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::respond::error_response;
use crate::state::AppState;

/// The resolved caller identity, available to handlers as
/// `Extension<AuthedUser>`.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
}

/// Axum middleware that resolves the caller's bearer credential against the
/// hosted identity service before any handler runs.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if token.is_empty() {
        return error_response(
            axum::http::StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            "missing bearer credential",
        );
    }

    match state.store.resolve_identity(token).await {
        Ok(identity) => {
            req.extensions_mut().insert(AuthedUser {
                user_id: identity.id,
            });
            next.run(req).await
        }
        Err(e) => crate::api::respond::error_from(&e),
    }
}

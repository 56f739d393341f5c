pub mod agents;
pub mod auth;
pub mod chat;
pub mod health;
pub mod respond;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (no auth required) and **protected**
/// (every request's bearer credential is resolved against the hosted
/// identity service by the middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/v1/healthz", get(health::healthz));

    let protected = Router::new()
        // Chat (core pipeline)
        .route("/v1/chat", post(chat::chat))
        // Agent management
        .route("/v1/agents", post(agents::create_agent).get(agents::list_agents))
        .route("/v1/agents/:id", get(agents::get_agent))
        .route("/v1/agents/:id", put(agents::update_agent))
        // Apply identity middleware to all protected routes.
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_identity,
        ));

    public.merge(protected)
}

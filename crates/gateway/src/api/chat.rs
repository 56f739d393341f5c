//! Chat API endpoint — the agent-scoped chat pipeline.
//!
//! - `POST /v1/chat` — one user message in, one completion out.

use axum::extract::State;
use axum::response::Json;
use axum::Extension;
use serde::Deserialize;

use crate::api::auth::AuthedUser;
use crate::api::respond::ApiError;
use crate::pipeline::{self, ChatInput};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub agent_id: String,
    /// User message text.
    pub message: String,
    /// Session to continue. A fresh one is generated when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Accepted for wire compatibility with existing clients; unused.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = pipeline::run_chat(
        &state,
        &user,
        ChatInput {
            agent_id: body.agent_id,
            message: body.message,
            session_id: body.session_id,
        },
    )
    .await?;

    Ok(Json(serde_json::json!({
        "data": {
            "response": outcome.response,
            "sessionId": outcome.session_id,
            "agentName": outcome.agent_name,
            "responseTime": outcome.response_time_ms,
        }
    })))
}

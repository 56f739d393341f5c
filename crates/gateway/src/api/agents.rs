//! Agent management endpoints.
//!
//! - `POST /v1/agents`     — create (caller becomes creator)
//! - `GET  /v1/agents`     — list agents visible to the caller
//! - `GET  /v1/agents/:id` — detail, gated by the visibility policy
//! - `PUT  /v1/agents/:id` — partial update, creator only

use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;

use mn_backend::types::{AgentFilter, AgentPatch, NewAgent};
use mn_domain::error::Error;
use mn_domain::model::Visibility;

use crate::api::auth::AuthedUser;
use crate::api::respond::ApiError;
use crate::pipeline::authorize;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt_template: String,
    #[serde(default)]
    pub system_instructions: String,
    /// Defaults to `private` when absent.
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub file_contexts: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub system_instructions: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub file_contexts: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/agents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn create_agent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(body): Json<CreateAgentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(Error::InvalidArgument("name is required".into()).into());
    }
    if body.category.trim().is_empty() {
        return Err(Error::InvalidArgument("category is required".into()).into());
    }

    let now = Utc::now();
    let agent = state
        .store
        .create_agent(NewAgent {
            name: body.name,
            category: body.category,
            description: body.description,
            prompt_template: body.prompt_template,
            system_instructions: body.system_instructions,
            visibility: body.visibility.unwrap_or(Visibility::Private),
            creator_id: user.user_id,
            organization_id: body.organization_id,
            file_contexts: body.file_contexts,
            created_at: now,
            updated_at: now,
        })
        .await?;

    Ok(Json(serde_json::json!({ "data": { "agent": agent } })))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/agents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_agents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let organizations = state.store.user_organizations(&user.user_id).await?;
    let agents = state
        .store
        .list_agents(
            &user.user_id,
            &organizations,
            &AgentFilter {
                category: query.category,
            },
        )
        .await?;

    Ok(Json(serde_json::json!({ "data": { "agents": agents } })))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/agents/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_agent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(agent_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if agent_id.trim().is_empty() {
        return Err(Error::InvalidArgument("agent id is required".into()).into());
    }

    let agent = state.store.fetch_agent(&agent_id).await?;
    authorize::check(state.store.as_ref(), &user.user_id, &agent).await?;

    Ok(Json(serde_json::json!({ "data": { "agent": agent } })))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PUT /v1/agents/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn update_agent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(agent_id): Path<String>,
    Json(body): Json<UpdateAgentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if agent_id.trim().is_empty() {
        return Err(Error::InvalidArgument("agent id is required".into()).into());
    }

    let existing = state.store.fetch_agent(&agent_id).await?;
    if !existing.is_creator(&user.user_id) {
        return Err(Error::PermissionDenied("only the creator can edit an agent".into()).into());
    }

    let patch = AgentPatch {
        name: body.name,
        category: body.category,
        description: body.description,
        prompt_template: body.prompt_template,
        system_instructions: body.system_instructions,
        visibility: body.visibility,
        file_contexts: body.file_contexts,
        updated_at: Some(Utc::now()),
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument("no editable fields in update".into()).into());
    }

    let agent = state.store.update_agent(&agent_id, patch).await?;
    Ok(Json(serde_json::json!({ "data": { "agent": agent } })))
}

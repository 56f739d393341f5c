//! The chat turn pipeline.
//!
//! Strictly linear per request: load agent → authorize → assemble context →
//! call model → record → respond. Identity is resolved upstream by the API
//! middleware. The only step that may fail without failing the request is
//! recording, which runs after the completion has already been produced.

pub mod authorize;
pub mod context;

use std::time::Instant;

use mn_backend::types::NewInteraction;
use mn_domain::error::{Error, Result};
use mn_domain::model::{Agent, Role};
use mn_providers::CompletionRequest;

use crate::api::auth::AuthedUser;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Input / outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct ChatInput {
    pub agent_id: String,
    pub message: String,
    /// Session to continue. A fresh one is generated when absent.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response: String,
    pub session_id: String,
    pub agent_name: String,
    /// Wall-clock duration of the completion call, in milliseconds.
    pub response_time_ms: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run one chat turn for an already-authenticated user.
pub async fn run_chat(state: &AppState, user: &AuthedUser, input: ChatInput) -> Result<ChatOutcome> {
    let agent_id = input.agent_id.trim();
    if agent_id.is_empty() {
        return Err(Error::InvalidArgument("agentId is required".into()));
    }
    if input.message.trim().is_empty() {
        return Err(Error::InvalidArgument("message is required".into()));
    }

    let agent = state.store.fetch_agent(agent_id).await?;
    authorize::check(state.store.as_ref(), &user.user_id, &agent).await?;

    let assembled = context::assemble(
        state.store.as_ref(),
        &state.config.chat,
        &agent,
        &input.message,
        input.session_id.as_deref(),
    )
    .await;

    let started = Instant::now();
    let completion = state
        .llm
        .complete(CompletionRequest {
            prompt: assembled.prompt,
            model: None,
        })
        .await?;
    let response_time_ms = started.elapsed().as_millis() as u64;

    tracing::info!(
        agent_id = %agent.id,
        session_id = %assembled.session_id,
        response_time_ms,
        "chat turn completed"
    );

    record_turn(
        state,
        user,
        &agent,
        &assembled.session_id,
        &input.message,
        &completion.text,
        response_time_ms,
    )
    .await;

    Ok(ChatOutcome {
        response: completion.text,
        session_id: assembled.session_id,
        agent_name: agent.name,
        response_time_ms,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Recording (best-effort)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Persist the turn and bump the usage counter.
///
/// Runs only after a successful completion. Each write failure is logged as
/// a persistence warning and swallowed — the caller still gets the reply.
async fn record_turn(
    state: &AppState,
    user: &AuthedUser,
    agent: &Agent,
    session_id: &str,
    message: &str,
    reply: &str,
    response_time_ms: u64,
) {
    let user_row = NewInteraction {
        user_id: user.user_id.clone(),
        agent_id: agent.id.clone(),
        organization_id: agent.organization_id.clone(),
        session_id: session_id.to_owned(),
        role: Role::User,
        content: message.to_owned(),
        response_time: None,
    };
    if let Err(e) = state.store.record_interaction(user_row).await {
        tracing::warn!(session_id, error = %e, "persistence warning: user turn write failed");
    }

    let assistant_row = NewInteraction {
        user_id: user.user_id.clone(),
        agent_id: agent.id.clone(),
        organization_id: agent.organization_id.clone(),
        session_id: session_id.to_owned(),
        role: Role::Assistant,
        content: reply.to_owned(),
        response_time: Some(response_time_ms),
    };
    if let Err(e) = state.store.record_interaction(assistant_row).await {
        tracing::warn!(session_id, error = %e, "persistence warning: assistant turn write failed");
    }

    if let Err(e) = state.store.increment_usage(&agent.id).await {
        tracing::warn!(agent_id = %agent.id, error = %e, "persistence warning: usage increment failed");
    }
}

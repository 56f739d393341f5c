//! Context assembly — turns an agent, a message, and an optional session
//! into one prompt string.
//!
//! Section order is fixed: system instructions, attached-file excerpts,
//! conversation history, then the current message folded into the agent's
//! template. Auxiliary fetches degrade gracefully: a failed file or history
//! read logs a warning and skips that section rather than failing the turn.

use uuid::Uuid;

use mn_backend::PlatformStore;
use mn_domain::config::ChatConfig;
use mn_domain::model::Agent;
use mn_domain::prompt::{apply_template, PromptBuilder};

/// The assembled prompt plus the concrete session id for this turn.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub prompt: String,
    pub session_id: String,
}

pub async fn assemble(
    store: &dyn PlatformStore,
    cfg: &ChatConfig,
    agent: &Agent,
    message: &str,
    session_id: Option<&str>,
) -> AssembledContext {
    let mut builder = PromptBuilder::new();

    // 1. Standing instructions come first so the model treats them as
    //    behavior, not conversational content.
    let instructions = if agent.system_instructions.trim().is_empty() {
        cfg.default_instructions.as_str()
    } else {
        agent.system_instructions.as_str()
    };
    builder.push(instructions);

    // 2. Attached-file excerpts, in attachment order.
    if !agent.file_contexts.is_empty() {
        match store.file_excerpts(&agent.file_contexts).await {
            Ok(files) => {
                for file in files {
                    builder.push(format!(
                        "File: {}\nContent: {}",
                        file.filename, file.extracted_text
                    ));
                }
            }
            Err(e) => {
                tracing::warn!(agent_id = %agent.id, error = %e, "file context fetch failed, skipping section");
            }
        }
    }

    // 3. Prior turns, oldest-to-newest, only when the caller named a session.
    if let Some(sid) = session_id {
        match store.session_history(sid, cfg.history_limit).await {
            Ok(turns) if !turns.is_empty() => {
                let lines: Vec<String> = turns
                    .iter()
                    .map(|t| format!("{}: {}", t.role.label(), t.content))
                    .collect();
                builder.push_labeled("Conversation history", lines.join("\n"));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(session_id = %sid, error = %e, "history fetch failed, skipping section");
            }
        }
    }

    // 4. The current message, folded into the agent's template.
    builder.push(apply_template(&agent.prompt_template, message));

    AssembledContext {
        prompt: builder.render(),
        session_id: session_id
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    }
}

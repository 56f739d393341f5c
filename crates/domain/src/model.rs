//! Core data model: agents and their persisted chat turns.
//!
//! Field names mirror the hosted store's column names so rows serialize
//! straight onto the REST interface without a mapping layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Access-control tier of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Creator-only. Organization membership does not override this.
    Private,
    /// Creator, plus members of the agent's owning organization.
    Organization,
    /// Any authenticated user.
    Public,
}

/// A stored AI persona: prompt template + instructions + visibility +
/// attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// May contain a `{message}` placeholder; see [`crate::prompt`].
    #[serde(default)]
    pub prompt_template: String,
    #[serde(default)]
    pub system_instructions: String,
    pub visibility: Visibility,
    pub creator_id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Ids of attached `file_uploads` rows whose extracted text is pulled
    /// into the prompt.
    #[serde(default)]
    pub file_contexts: Vec<String>,
    #[serde(default)]
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Interaction turns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which side of the conversation produced a turn.
///
/// Interaction rows are append-only and tied together solely by a session
/// id — sessions have no record of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The label used when a turn is rendered into a prompt history line.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

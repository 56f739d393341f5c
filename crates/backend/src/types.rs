//! Wire types exchanged with the hosted platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mn_domain::model::{Role, Visibility};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Identity
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The identity the auth service hands back for a verified bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent writes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Insert body for a new `ai_agents` row.
#[derive(Debug, Clone, Serialize)]
pub struct NewAgent {
    pub name: String,
    pub category: String,
    pub description: String,
    pub prompt_template: String,
    pub system_instructions: String,
    pub visibility: Visibility,
    pub creator_id: String,
    pub organization_id: Option<String>,
    pub file_contexts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an `ai_agents` row. `None` fields are left untouched.
/// Only the creator-editable columns appear here; `usage_count` moves solely
/// through the atomic increment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_contexts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AgentPatch {
    /// True when no editable column is set (`updated_at` alone doesn't count).
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.prompt_template.is_none()
            && self.system_instructions.is_none()
            && self.visibility.is_none()
            && self.file_contexts.is_none()
    }
}

/// Optional narrowing applied to an agent listing on top of the visibility
/// filter.
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub category: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Interactions & context
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Insert body for an `ai_interactions` row. `created_at` is assigned by the
/// store so turn ordering follows its clock, not ours.
#[derive(Debug, Clone, Serialize)]
pub struct NewInteraction {
    pub user_id: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    pub session_id: String,
    #[serde(rename = "message_type")]
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
}

/// One prior turn pulled back for prompt assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    #[serde(rename = "message_type")]
    pub role: Role,
    pub content: String,
}

/// Extracted text of an attached file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileExcerpt {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub extracted_text: String,
}

/// Row shape of `organization_memberships` reads.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MembershipRow {
    pub organization_id: String,
}

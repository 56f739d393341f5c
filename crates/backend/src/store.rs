//! The [`PlatformStore`] trait — everything the gateway asks of the hosted
//! platform, in one seam.

use async_trait::async_trait;

use mn_domain::error::Result;
use mn_domain::model::Agent;

use crate::types::{
    AgentFilter, AgentPatch, FileExcerpt, HistoryTurn, NewAgent, NewInteraction, UserIdentity,
};

/// Identity and persistence operations delegated to the hosted platform.
///
/// Implementations: [`crate::rest::RestPlatformClient`] against the real
/// platform; test suites provide in-memory fakes.
#[async_trait]
pub trait PlatformStore: Send + Sync {
    /// Exchange a caller's bearer token for a verified identity.
    /// Fails with `Unauthenticated` when the token is rejected.
    async fn resolve_identity(&self, bearer_token: &str) -> Result<UserIdentity>;

    /// Fetch one agent by id. Fails with `NotFound` when no row exists.
    async fn fetch_agent(&self, agent_id: &str) -> Result<Agent>;

    /// Insert a new agent and return the stored row.
    async fn create_agent(&self, agent: NewAgent) -> Result<Agent>;

    /// List agents visible to `viewer`: public ones, their own, and
    /// `organization` ones owned by any of `organizations`. Newest first.
    async fn list_agents(
        &self,
        viewer: &str,
        organizations: &[String],
        filter: &AgentFilter,
    ) -> Result<Vec<Agent>>;

    /// Apply a partial update to an agent and return the stored row.
    /// Creator checks happen at the call site, not here.
    async fn update_agent(&self, agent_id: &str, patch: AgentPatch) -> Result<Agent>;

    /// Organization ids the user belongs to.
    async fn user_organizations(&self, user_id: &str) -> Result<Vec<String>>;

    /// Extracted text for the given file ids, in the order the ids were
    /// supplied. Unknown ids are silently absent from the result.
    async fn file_excerpts(&self, file_ids: &[String]) -> Result<Vec<FileExcerpt>>;

    /// Up to `limit` most recent turns of a session, returned
    /// oldest-to-newest.
    async fn session_history(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryTurn>>;

    /// Append one interaction row.
    async fn record_interaction(&self, row: NewInteraction) -> Result<()>;

    /// Atomically bump the agent's usage counter by one (storage-side
    /// increment, not read-modify-write).
    async fn increment_usage(&self, agent_id: &str) -> Result<()>;
}

//! In-memory fake of the hosted platform for integration tests.
//!
//! Mirrors the visibility filtering, history windowing, and atomic counter
//! semantics of the real store closely enough to exercise the full chat
//! pipeline without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use mn_backend::types::{
    AgentFilter, AgentPatch, FileExcerpt, HistoryTurn, NewAgent, NewInteraction, UserIdentity,
};
use mn_backend::PlatformStore;
use mn_domain::error::{Error, Result};
use mn_domain::model::{Agent, Visibility};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_files: AtomicBool,
    fail_history: AtomicBool,
}

#[derive(Default)]
struct Inner {
    /// bearer token -> user id
    tokens: HashMap<String, String>,
    agents: HashMap<String, Agent>,
    /// user id -> organization ids
    memberships: HashMap<String, Vec<String>>,
    files: HashMap<String, FileExcerpt>,
    /// Insertion order doubles as time order.
    interactions: Vec<NewInteraction>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── seeding ──────────────────────────────────────────────────────

    pub fn add_token(&self, token: &str, user_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.tokens.insert(token.to_owned(), user_id.to_owned());
    }

    pub fn add_agent(&self, agent: Agent) {
        let mut inner = self.inner.lock().unwrap();
        inner.agents.insert(agent.id.clone(), agent);
    }

    pub fn add_membership(&self, user_id: &str, organization_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .memberships
            .entry(user_id.to_owned())
            .or_default()
            .push(organization_id.to_owned());
    }

    pub fn add_file(&self, id: &str, filename: &str, extracted_text: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.files.insert(
            id.to_owned(),
            FileExcerpt {
                id: id.to_owned(),
                filename: filename.to_owned(),
                extracted_text: extracted_text.to_owned(),
            },
        );
    }

    /// Make subsequent file-excerpt fetches fail.
    pub fn fail_file_fetches(&self) {
        self.fail_files.store(true, Ordering::SeqCst);
    }

    /// Make subsequent history fetches fail.
    pub fn fail_history_fetches(&self) {
        self.fail_history.store(true, Ordering::SeqCst);
    }

    // ── inspection ───────────────────────────────────────────────────

    pub fn interactions(&self) -> Vec<NewInteraction> {
        self.inner.lock().unwrap().interactions.clone()
    }

    pub fn usage_count(&self, agent_id: &str) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .agents
            .get(agent_id)
            .map(|a| a.usage_count)
            .unwrap_or(0)
    }
}

/// Build a minimal agent row for seeding.
pub fn make_agent(id: &str, visibility: Visibility, creator: &str, org: Option<&str>) -> Agent {
    let now = Utc::now();
    Agent {
        id: id.to_owned(),
        name: format!("{id}-name"),
        category: "general".into(),
        description: String::new(),
        prompt_template: String::new(),
        system_instructions: String::new(),
        visibility,
        creator_id: creator.to_owned(),
        organization_id: org.map(Into::into),
        file_contexts: Vec::new(),
        usage_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl PlatformStore for MemoryStore {
    async fn resolve_identity(&self, bearer_token: &str) -> Result<UserIdentity> {
        let inner = self.inner.lock().unwrap();
        inner
            .tokens
            .get(bearer_token)
            .map(|id| UserIdentity {
                id: id.clone(),
                email: None,
            })
            .ok_or_else(|| Error::Unauthenticated("credential rejected".into()))
    }

    async fn fetch_agent(&self, agent_id: &str) -> Result<Agent> {
        let inner = self.inner.lock().unwrap();
        inner
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))
    }

    async fn create_agent(&self, agent: NewAgent) -> Result<Agent> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = format!("agent-{}", inner.next_id);
        let row = Agent {
            id: id.clone(),
            name: agent.name,
            category: agent.category,
            description: agent.description,
            prompt_template: agent.prompt_template,
            system_instructions: agent.system_instructions,
            visibility: agent.visibility,
            creator_id: agent.creator_id,
            organization_id: agent.organization_id,
            file_contexts: agent.file_contexts,
            usage_count: 0,
            created_at: agent.created_at,
            updated_at: agent.updated_at,
        };
        inner.agents.insert(id, row.clone());
        Ok(row)
    }

    async fn list_agents(
        &self,
        viewer: &str,
        organizations: &[String],
        filter: &AgentFilter,
    ) -> Result<Vec<Agent>> {
        let inner = self.inner.lock().unwrap();
        let mut agents: Vec<Agent> = inner
            .agents
            .values()
            .filter(|a| {
                a.visibility == Visibility::Public
                    || a.creator_id == viewer
                    || (a.visibility == Visibility::Organization
                        && a.organization_id
                            .as_deref()
                            .is_some_and(|org| organizations.iter().any(|m| m == org)))
            })
            .filter(|a| {
                filter
                    .category
                    .as_deref()
                    .map(|c| a.category == c)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        agents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(agents)
    }

    async fn update_agent(&self, agent_id: &str, patch: AgentPatch) -> Result<Agent> {
        let mut inner = self.inner.lock().unwrap();
        let agent = inner
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))?;

        if let Some(name) = patch.name {
            agent.name = name;
        }
        if let Some(category) = patch.category {
            agent.category = category;
        }
        if let Some(description) = patch.description {
            agent.description = description;
        }
        if let Some(template) = patch.prompt_template {
            agent.prompt_template = template;
        }
        if let Some(instructions) = patch.system_instructions {
            agent.system_instructions = instructions;
        }
        if let Some(visibility) = patch.visibility {
            agent.visibility = visibility;
        }
        if let Some(files) = patch.file_contexts {
            agent.file_contexts = files;
        }
        if let Some(updated_at) = patch.updated_at {
            agent.updated_at = updated_at;
        }
        Ok(agent.clone())
    }

    async fn user_organizations(&self, user_id: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.memberships.get(user_id).cloned().unwrap_or_default())
    }

    async fn file_excerpts(&self, file_ids: &[String]) -> Result<Vec<FileExcerpt>> {
        if self.fail_files.load(Ordering::SeqCst) {
            return Err(Error::Backend("file store down".into()));
        }
        let inner = self.inner.lock().unwrap();
        Ok(file_ids
            .iter()
            .filter_map(|id| inner.files.get(id).cloned())
            .collect())
    }

    async fn session_history(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryTurn>> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Error::Backend("history store down".into()));
        }
        let inner = self.inner.lock().unwrap();
        let turns: Vec<HistoryTurn> = inner
            .interactions
            .iter()
            .filter(|i| i.session_id == session_id)
            .map(|i| HistoryTurn {
                role: i.role,
                content: i.content.clone(),
            })
            .collect();
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }

    async fn record_interaction(&self, row: NewInteraction) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.interactions.push(row);
        Ok(())
    }

    async fn increment_usage(&self, agent_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let agent = inner
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))?;
        agent.usage_count += 1;
        Ok(())
    }
}

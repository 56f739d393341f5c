//! REST implementation of [`PlatformStore`].
//!
//! `RestPlatformClient` wraps a `reqwest::Client` and translates every trait
//! method into the corresponding HTTP call against the hosted platform:
//! `GET /auth/v1/user` for identity, PostgREST-style filtered reads, inserts
//! and patches under `/rest/v1/`, and the `increment_agent_usage` RPC for the
//! usage counter. Every call is a single attempt — the chat pipeline is
//! strictly linear, with no retry loop.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use mn_domain::config::BackendConfig;
use mn_domain::error::{Error, Result};
use mn_domain::model::Agent;

use crate::store::PlatformStore;
use crate::types::{
    AgentFilter, AgentPatch, FileExcerpt, HistoryTurn, MembershipRow, NewAgent, NewInteraction,
    UserIdentity,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST client for the hosted platform.
///
/// Created once at startup and reused for the lifetime of the process; the
/// underlying `reqwest::Client` maintains a connection pool. Data-store calls
/// authenticate with the service key; identity resolution forwards the
/// caller's own bearer token.
#[derive(Debug, Clone)]
pub struct RestPlatformClient {
    http: Client,
    base_url: String,
    service_key: String,
}

impl RestPlatformClient {
    /// Build a new client from the shared [`BackendConfig`].
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let service_key = cfg.auth.resolve("backend service key")?;
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            service_key,
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Build the full URL for a path like `/rest/v1/ai_agents`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decorate a data-store request with the service credentials.
    fn service_headers(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("Authorization", format!("Bearer {}", self.service_key))
            .header("apikey", &self.service_key)
            .header("X-Trace-Id", Uuid::new_v4().to_string())
    }

    /// Execute a request and classify the outcome.
    ///
    /// Non-success statuses become `Error::Backend` (the caller decides
    /// whether an empty result set means `NotFound`); transport failures are
    /// reported the same way, with the endpoint named in the message.
    async fn execute(&self, endpoint: &str, rb: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let result = rb.send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                let status = resp.status();
                tracing::debug!(endpoint, status = status.as_u16(), duration_ms, "backend call");

                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(Error::Backend(format!(
                        "{endpoint} returned {}: {body}",
                        status.as_u16()
                    )));
                }
                Ok(resp)
            }
            Err(e) => {
                tracing::debug!(endpoint, duration_ms, error = %e, "backend call failed");
                if e.is_timeout() {
                    Err(Error::Backend(format!("{endpoint} timed out: {e}")))
                } else {
                    Err(Error::Backend(format!("{endpoint}: {e}")))
                }
            }
        }
    }

    /// Execute and deserialize a row-set response.
    async fn rows<T: DeserializeOwned>(&self, endpoint: &str, rb: RequestBuilder) -> Result<Vec<T>> {
        let resp = self.execute(endpoint, rb).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Backend(format!("{endpoint}: reading body failed: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Backend(format!("{endpoint}: unexpected row shape: {e}: {body}")))
    }

    /// Liveness probe against the auth service, used by `doctor`.
    pub async fn health(&self) -> Result<()> {
        let url = self.url("/auth/v1/health");
        self.execute("GET /auth/v1/health", self.http.get(&url).header("apikey", &self.service_key))
            .await?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PostgREST filter builders
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render an `in.(…)` filter value for a list of ids.
fn in_filter(ids: &[String]) -> String {
    format!("in.({})", ids.join(","))
}

/// Render the visibility `or=` disjunction for a listing: public rows, the
/// viewer's own rows, and organization rows owned by any of the viewer's
/// organizations.
fn visibility_filter(viewer: &str, organizations: &[String]) -> String {
    if organizations.is_empty() {
        format!("(visibility.eq.public,creator_id.eq.{viewer})")
    } else {
        format!(
            "(visibility.eq.public,creator_id.eq.{viewer},and(visibility.eq.organization,organization_id.{}))",
            in_filter(organizations)
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl PlatformStore for RestPlatformClient {
    async fn resolve_identity(&self, bearer_token: &str) -> Result<UserIdentity> {
        let url = self.url("/auth/v1/user");
        let start = Instant::now();
        let result = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {bearer_token}"))
            .header("apikey", &self.service_key)
            .send()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = result.map_err(|e| {
            tracing::debug!(duration_ms, error = %e, "identity call failed");
            Error::Backend(format!("GET /auth/v1/user: {e}"))
        })?;

        let status = resp.status();
        tracing::debug!(status = status.as_u16(), duration_ms, "identity call");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthenticated(
                "credential rejected by the identity service".into(),
            ));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "GET /auth/v1/user returned {}: {body}",
                status.as_u16()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Backend(format!("GET /auth/v1/user: reading body failed: {e}")))?;
        serde_json::from_str(&body).map_err(|e| {
            Error::Backend(format!("GET /auth/v1/user: unexpected identity shape: {e}"))
        })
    }

    async fn fetch_agent(&self, agent_id: &str) -> Result<Agent> {
        let url = self.url("/rest/v1/ai_agents");
        let rb = self
            .service_headers(self.http.get(&url))
            .query(&[("id", format!("eq.{agent_id}")), ("limit", "1".into())]);

        let mut agents: Vec<Agent> = self.rows("GET /rest/v1/ai_agents", rb).await?;
        agents
            .pop()
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))
    }

    async fn create_agent(&self, agent: NewAgent) -> Result<Agent> {
        let url = self.url("/rest/v1/ai_agents");
        let rb = self
            .service_headers(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(&agent);

        let mut rows: Vec<Agent> = self.rows("POST /rest/v1/ai_agents", rb).await?;
        rows.pop()
            .ok_or_else(|| Error::Backend("agent insert returned no representation".into()))
    }

    async fn list_agents(
        &self,
        viewer: &str,
        organizations: &[String],
        filter: &AgentFilter,
    ) -> Result<Vec<Agent>> {
        let url = self.url("/rest/v1/ai_agents");
        let mut query: Vec<(String, String)> = vec![
            ("or".into(), visibility_filter(viewer, organizations)),
            ("order".into(), "created_at.desc".into()),
        ];
        if let Some(ref category) = filter.category {
            query.push(("category".into(), format!("eq.{category}")));
        }
        let rb = self.service_headers(self.http.get(&url)).query(&query);
        self.rows("GET /rest/v1/ai_agents", rb).await
    }

    async fn update_agent(&self, agent_id: &str, patch: AgentPatch) -> Result<Agent> {
        let url = self.url("/rest/v1/ai_agents");
        let rb = self
            .service_headers(self.http.patch(&url))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{agent_id}"))])
            .json(&patch);

        let mut rows: Vec<Agent> = self.rows("PATCH /rest/v1/ai_agents", rb).await?;
        rows.pop()
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))
    }

    async fn user_organizations(&self, user_id: &str) -> Result<Vec<String>> {
        let url = self.url("/rest/v1/organization_memberships");
        let rb = self.service_headers(self.http.get(&url)).query(&[
            ("user_id", format!("eq.{user_id}")),
            ("select", "organization_id".into()),
        ]);

        let rows: Vec<MembershipRow> = self
            .rows("GET /rest/v1/organization_memberships", rb)
            .await?;
        Ok(rows.into_iter().map(|m| m.organization_id).collect())
    }

    async fn file_excerpts(&self, file_ids: &[String]) -> Result<Vec<FileExcerpt>> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.url("/rest/v1/file_uploads");
        let rb = self.service_headers(self.http.get(&url)).query(&[
            ("id", in_filter(file_ids)),
            ("select", "id,filename,extracted_text".into()),
        ]);

        let mut rows: Vec<FileExcerpt> = self.rows("GET /rest/v1/file_uploads", rb).await?;

        // The store returns rows in its own order; restore attachment order.
        rows.sort_by_key(|f| file_ids.iter().position(|id| *id == f.id).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn session_history(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryTurn>> {
        let url = self.url("/rest/v1/ai_interactions");
        let rb = self.service_headers(self.http.get(&url)).query(&[
            ("session_id", format!("eq.{session_id}")),
            ("select", "message_type,content".into()),
            ("order", "created_at.desc".into()),
            ("limit", limit.to_string()),
        ]);

        // Newest-first fetch bounds the window to the *last* `limit` turns;
        // reverse to hand the assembler oldest-to-newest.
        let mut turns: Vec<HistoryTurn> = self.rows("GET /rest/v1/ai_interactions", rb).await?;
        turns.reverse();
        Ok(turns)
    }

    async fn record_interaction(&self, row: NewInteraction) -> Result<()> {
        let url = self.url("/rest/v1/ai_interactions");
        let rb = self.service_headers(self.http.post(&url)).json(&row);
        self.execute("POST /rest/v1/ai_interactions", rb).await?;
        Ok(())
    }

    async fn increment_usage(&self, agent_id: &str) -> Result<()> {
        let url = self.url("/rest/v1/rpc/increment_agent_usage");
        let rb = self
            .service_headers(self.http.post(&url))
            .json(&serde_json::json!({ "agent_id": agent_id }));
        self.execute("POST /rest/v1/rpc/increment_agent_usage", rb)
            .await?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

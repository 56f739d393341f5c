use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::prompt::DEFAULT_SYSTEM_INSTRUCTIONS;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Validate the configuration once at startup.
    ///
    /// Checks structural invariants only — secrets are resolved (and thus
    /// checked) where they are first used, so that `config validate` works
    /// on machines that don't hold the production keys.
    pub fn validate(&self) -> Result<()> {
        if !self.backend.base_url.starts_with("http") {
            return Err(Error::Config(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.backend.base_url
            )));
        }
        if !self.llm.base_url.starts_with("http") {
            return Err(Error::Config(format!(
                "llm.base_url must be an http(s) URL, got '{}'",
                self.llm.base_url
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::Config("llm.model must not be empty".into()));
        }
        if self.llm.max_tokens == 0 {
            return Err(Error::Config("llm.max_tokens must be > 0".into()));
        }
        if self.chat.history_limit == 0 {
            return Err(Error::Config("chat.history_limit must be > 0".into()));
        }
        if let Some(ref rl) = self.server.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                return Err(Error::Config(
                    "server.rate_limit: requests_per_second and burst_size must be > 0".into(),
                ));
            }
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_3400")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Per-IP token-bucket rate limiting configuration.
    /// When `None` (the default), rate limiting is disabled — suitable for
    /// local development.  Set `requests_per_second` and `burst_size` in
    /// production.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3400,
            host: "127.0.0.1".into(),
            cors: CorsConfig::default(),
            rate_limit: None,
        }
    }
}

/// Per-IP token-bucket rate limiting configuration.
///
/// `requests_per_second` controls the replenishment rate, while `burst_size`
/// sets the maximum number of requests a single IP can send in a quick burst
/// before being throttled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed for CORS. Use `["*"]` for permissive (NOT recommended).
    /// Defaults to localhost-only.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Hosted backend platform (auth + data store)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection to the hosted platform that owns identity and persistence.
///
/// The same `base_url` serves the auth endpoint (`/auth/v1/…`) and the
/// row-level REST endpoint (`/rest/v1/…`).  `auth` resolves the service
/// key used for data-store access; end-user credentials arrive per-request
/// and are never configured here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "d_backend_url")]
    pub base_url: String,
    #[serde(default = "d_backend_auth")]
    pub auth: AuthConfig,
    #[serde(default = "d_8000")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: d_backend_url(),
            auth: d_backend_auth(),
            timeout_ms: 8000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM completion provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_provider_kind")]
    pub kind: ProviderKind,
    #[serde(default = "d_llm_url")]
    pub base_url: String,
    #[serde(default = "d_llm_auth")]
    pub auth: AuthConfig,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_1024")]
    pub max_tokens: u32,
    /// Sampling temperature. `None` lets the provider choose.
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "d_120000")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            base_url: d_llm_url(),
            auth: d_llm_auth(),
            model: d_model(),
            max_tokens: 1024,
            temperature: None,
            timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Anthropic,
    OpenaiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer `env`).
    #[serde(default)]
    pub key: Option<String>,
}

impl AuthConfig {
    /// Resolve the configured secret.
    ///
    /// Precedence:
    /// 1. `key` field (plaintext — warn)
    /// 2. `env` field (reads environment variable)
    /// 3. Error
    pub fn resolve(&self, purpose: &str) -> Result<String> {
        if let Some(ref key) = self.key {
            tracing::warn!(
                purpose,
                "secret loaded from plaintext config field 'key' — prefer 'env' instead"
            );
            return Ok(key.clone());
        }
        if let Some(ref env_var) = self.env {
            return std::env::var(env_var).map_err(|_| {
                Error::Config(format!(
                    "environment variable '{env_var}' ({purpose}) not set or not valid UTF-8"
                ))
            });
        }
        Err(Error::Config(format!(
            "no secret configured for {purpose}: set 'key' or 'env'"
        )))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum number of prior turns pulled into the prompt when a session
    /// id is supplied.
    #[serde(default = "d_10")]
    pub history_limit: usize,
    /// Instruction used when an agent has empty `system_instructions`.
    #[serde(default = "d_instructions")]
    pub default_instructions: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            default_instructions: d_instructions(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Observability
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// OTLP gRPC endpoint (e.g. `http://localhost:4317`).
    /// When `None`, OpenTelemetry export is disabled.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// The `service.name` resource attribute reported to the collector.
    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Trace sampling rate (`0.0` = never, `1.0` = always).
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_3400() -> u16 {
    3400
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}
fn d_backend_url() -> String {
    "http://localhost:54321".into()
}
fn d_backend_auth() -> AuthConfig {
    AuthConfig {
        env: Some("MENTORA_SERVICE_KEY".into()),
        key: None,
    }
}
fn d_provider_kind() -> ProviderKind {
    ProviderKind::Anthropic
}
fn d_llm_url() -> String {
    "https://api.anthropic.com".into()
}
fn d_llm_auth() -> AuthConfig {
    AuthConfig {
        env: Some("ANTHROPIC_API_KEY".into()),
        key: None,
    }
}
fn d_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn d_8000() -> u64 {
    8000
}
fn d_120000() -> u64 {
    120_000
}
fn d_1024() -> u32 {
    1024
}
fn d_10() -> usize {
    10
}
fn d_instructions() -> String {
    DEFAULT_SYSTEM_INSTRUCTIONS.into()
}
fn d_service_name() -> String {
    "mentora".into()
}
fn d_sample_rate() -> f64 {
    1.0
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

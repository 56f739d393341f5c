//! Anthropic-native adapter.
//!
//! Implements the non-streaming Anthropic Messages API. The assembled prompt
//! already carries the agent's instructions, so it travels as a single user
//! message rather than a separate `system` field.

use serde_json::Value;

use mn_domain::config::LlmConfig;
use mn_domain::error::{Error, Result};

use crate::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::util::{upstream_status, upstream_transport};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER_ID: &str = "anthropic";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A completion adapter for the Anthropic Messages API.
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new adapter from the shared LLM config.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = cfg.auth.resolve("anthropic api key")?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key,
            default_model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            client,
        })
    }

    fn build_body(&self, req: &CompletionRequest) -> Value {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let mut body = serde_json::json!({
            "model": model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": req.prompt }],
        });
        if let Some(temp) = self.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_response(body: &Value) -> Result<CompletionResponse> {
    let text: String = body
        .get("content")
        .and_then(|v| v.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::Upstream {
            provider: PROVIDER_ID.into(),
            message: "response contained no text content".into(),
        });
    }

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_owned();

    Ok(CompletionResponse { text, model })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_body(&req);

        tracing::debug!(url = %url, "anthropic completion request");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream_transport(PROVIDER_ID, e))?;

        let status = resp.status();
        let resp_text = resp
            .text()
            .await
            .map_err(|e| upstream_transport(PROVIDER_ID, e))?;

        if !status.is_success() {
            return Err(upstream_status(PROVIDER_ID, status, &resp_text));
        }

        let resp_json: Value = serde_json::from_str(&resp_text).map_err(|e| Error::Upstream {
            provider: PROVIDER_ID.into(),
            message: format!("unparseable response: {e}"),
        })?;
        parse_response(&resp_json)
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

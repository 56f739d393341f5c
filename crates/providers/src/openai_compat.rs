//! OpenAI-compatible adapter.
//!
//! Works against any endpoint speaking the `/chat/completions` dialect
//! (OpenAI, DeepSeek, local inference servers). `base_url` should include
//! the version segment, e.g. `https://api.openai.com/v1`.

use serde_json::Value;

use mn_domain::config::LlmConfig;
use mn_domain::error::{Error, Result};

use crate::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::util::{upstream_status, upstream_transport};

const PROVIDER_ID: &str = "openai_compat";

/// A completion adapter for OpenAI-compatible chat completion APIs.
pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new adapter from the shared LLM config.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = cfg.auth.resolve("openai-compatible api key")?;
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

fn parse_response(body: &Value) -> Result<CompletionResponse> {
    let text = body
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_owned();

    if text.is_empty() {
        return Err(Error::Upstream {
            provider: PROVIDER_ID.into(),
            message: "response contained no message content".into(),
        });
    }

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_owned();

    Ok(CompletionResponse { text, model })
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&req);

        tracing::debug!(url = %url, "openai-compat completion request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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

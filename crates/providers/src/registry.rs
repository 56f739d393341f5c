//! Provider construction.

use std::sync::Arc;

use mn_domain::config::{LlmConfig, ProviderKind};
use mn_domain::error::Result;

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::CompletionProvider;

/// Build the process-wide completion provider from config.
///
/// Resolves the API key eagerly so a missing secret fails at startup, not on
/// the first chat request.
pub fn build_provider(cfg: &LlmConfig) -> Result<Arc<dyn CompletionProvider>> {
    let provider: Arc<dyn CompletionProvider> = match cfg.kind {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::from_config(cfg)?),
        ProviderKind::OpenaiCompat => Arc::new(OpenAiCompatProvider::from_config(cfg)?),
    };
    tracing::info!(
        provider = provider.provider_id(),
        model = %cfg.model,
        "completion provider initialized"
    );
    Ok(provider)
}

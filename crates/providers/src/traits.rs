use mn_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic completion request.
///
/// The prompt arrives fully assembled — instructions, file context, and
/// history are already folded in — so adapters only shape the wire format.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// The assembled prompt text.
    pub prompt: String,
    /// Model identifier override. When `None`, the adapter uses its
    /// configured default.
    pub model: Option<String>,
}

/// A provider-agnostic completion response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text of the first (and only) completion.
    pub text: String,
    /// The model that actually produced the response.
    pub model: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait every completion adapter implements.
///
/// One call, one text completion. Any failure — transport, timeout, or a
/// non-success status — surfaces as `Error::Upstream` and aborts the chat
/// request before anything is persisted.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a completion request and wait for the full response.
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}

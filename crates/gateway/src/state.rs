use std::sync::Arc;

use mn_backend::PlatformStore;
use mn_domain::config::Config;
use mn_providers::CompletionProvider;

/// Shared application state passed to all API handlers.
///
/// Deliberately small: configuration and the two outbound seams. Requests
/// share nothing mutable — identity, agents, and context are re-fetched from
/// the hosted platform on every call.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Hosted platform: identity + persistence.
    pub store: Arc<dyn PlatformStore>,
    /// Model completion endpoint.
    pub llm: Arc<dyn CompletionProvider>,
}

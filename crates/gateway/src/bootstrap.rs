//! Startup wiring: validate config once, build the outbound clients, and
//! assemble [`AppState`].

use std::sync::Arc;

use anyhow::Context;

use mn_backend::RestPlatformClient;
use mn_domain::config::Config;

use crate::state::AppState;

pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    config.validate().context("config validation")?;

    let store = RestPlatformClient::new(&config.backend).context("backend client")?;
    let llm = mn_providers::build_provider(&config.llm).context("completion provider")?;

    tracing::info!(
        backend = %config.backend.base_url,
        "platform backend configured"
    );

    Ok(AppState {
        config,
        store: Arc::new(store),
        llm,
    })
}

use std::sync::Arc;

use anyhow::Result;

use crate::analytics::ScenarioCatalog;
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Nothing in here is mutable: each request opens its own upstream stream.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// Mock business-data templates, validated once at startup.
    pub scenarios: Arc<ScenarioCatalog>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let llm = LlmClient::new(
            config.anthropic_api_key.clone(),
            &config.anthropic_base_url,
        )?;
        let scenarios = Arc::new(ScenarioCatalog::load()?);

        Ok(Self { llm, scenarios })
    }
}

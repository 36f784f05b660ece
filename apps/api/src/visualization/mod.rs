//! Visualization Generator: one structured call that turns a learner's prompt
//! and a small sales table into a chart configuration.
//!
//! The model is allowed to fill in whatever the prompt leaves out (colors,
//! title, labels); seeing those guesses is the point of the exercise. Any
//! failure yields `ChartSpec::fallback()` instead of an error.

pub mod handlers;
pub mod prompts;

use tracing::{debug, warn};

use crate::llm_client::prompts::{JSON_ONLY_FOOTER, JSON_ONLY_SYSTEM};
use crate::llm_client::structured::parse_or_fallback;
use crate::llm_client::ChatRelay;
use crate::models::chart::{ChartSpec, SalesRecord};
use crate::models::chat::{ChatRequest, Language};
use prompts::{CHART_MAX_TOKENS, CHART_PROMPT_TEMPLATE};

pub fn chart_request(
    prompt: &str,
    data: &[SalesRecord],
    language: Option<Language>,
) -> Result<ChatRequest, serde_json::Error> {
    let sales_data = serde_json::to_string_pretty(data)?;
    let content = CHART_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_FOOTER)
        .replace("{sales_data}", &sales_data)
        .replace("{user_prompt}", prompt);

    let mut request = ChatRequest::single_user(content, CHART_MAX_TOKENS).with_language(language);
    request.system = Some(JSON_ONLY_SYSTEM.to_string());
    Ok(request)
}

pub async fn generate_chart(
    relay: &dyn ChatRelay,
    prompt: &str,
    data: &[SalesRecord],
    language: Option<Language>,
) -> ChartSpec {
    let request = match chart_request(prompt, data, language) {
        Ok(request) => request,
        Err(e) => {
            warn!("Could not serialize chart data, using default chart: {e}");
            return ChartSpec::fallback();
        }
    };

    match relay.complete(&request).await {
        Ok(raw) => {
            debug!("Chart call returned {} chars", raw.len());
            parse_or_fallback(&raw, ChartSpec::fallback)
        }
        Err(e) => {
            warn!("Chart call failed, using default chart: {e}");
            ChartSpec::fallback()
        }
    }
}

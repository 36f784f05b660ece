use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub data: Value,
    pub cached: bool,
    pub scenario: usize,
}

/// GET /api/generate-analytics
///
/// Returns one of the fixed scenario templates, chosen uniformly at random.
pub async fn handle_generate_analytics(State(state): State<AppState>) -> Json<AnalyticsResponse> {
    let (scenario, data) = state.scenarios.pick_random();
    tracing::debug!("Serving analytics scenario {scenario}");

    Json(AnalyticsResponse {
        data: data.clone(),
        cached: false,
        scenario,
    })
}

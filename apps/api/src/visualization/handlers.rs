use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::chart::{quarterly_sales_2024, ChartSpec, SalesRecord};
use crate::models::chat::Language;
use crate::state::AppState;
use crate::visualization::generate_chart;

#[derive(Debug, Deserialize)]
pub struct VisualizationRequest {
    pub prompt: String,
    /// Defaults to the 2024 quarterly sales table.
    pub data: Option<Vec<SalesRecord>>,
    pub language: Option<Language>,
}

/// POST /api/visualizations
///
/// Always answers 200 with a chart once the body validates; upstream and
/// parse failures come back as the default chart.
pub async fn handle_generate_visualization(
    State(state): State<AppState>,
    payload: Result<Json<VisualizationRequest>, JsonRejection>,
) -> Result<Json<ChartSpec>, AppError> {
    let Json(request) = payload?;

    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    let data = match request.data {
        Some(data) if data.is_empty() => {
            return Err(AppError::Validation("data cannot be empty".to_string()))
        }
        Some(data) => data,
        None => quarterly_sales_2024(),
    };

    let chart = generate_chart(&state.llm, &request.prompt, &data, request.language).await;
    Ok(Json(chart))
}

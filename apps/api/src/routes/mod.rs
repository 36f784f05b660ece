pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analytics::handlers::handle_generate_analytics;
use crate::exercise::handlers::handle_submit_exercise;
use crate::relay::handlers::handle_messages;
use crate::state::AppState;
use crate::visualization::handlers::handle_generate_visualization;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat relay
        .route("/api/messages", post(handle_messages))
        // Exercises
        .route("/api/exercises/submit", post(handle_submit_exercise))
        .route("/api/visualizations", post(handle_generate_visualization))
        // Mock data
        .route("/api/generate-analytics", get(handle_generate_analytics))
        .with_state(state)
}

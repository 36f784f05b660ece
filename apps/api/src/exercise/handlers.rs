//! Axum route handler for graded exercise submissions.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::exercise::context::{ContextDocument, LessonContext};
use crate::exercise::runner::{ExerciseRunner, ExerciseSubmission};
use crate::exercise::scoring::used_suggestion;
use crate::exercise::state::{AttemptPhase, ExerciseAttempt};
use crate::models::chart::{ChartSpec, SalesRecord};
use crate::models::chat::Language;
use crate::models::evaluation::EvaluationResult;
use crate::state::AppState;
use crate::visualization::generate_chart;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExerciseRequest {
    pub prompt: String,
    pub scenario: String,
    #[serde(default)]
    pub documents: Vec<ContextDocument>,
    pub criteria: String,
    #[serde(default)]
    pub enable_web_search: bool,
    /// Settled submissions on this exercise before this one. The browser
    /// keeps the counter between requests.
    #[serde(default)]
    pub attempts_so_far: u32,
    #[serde(default)]
    pub revealed_suggestions: Vec<String>,
    /// 1-based index of the analytics scenario loaded into the exercise.
    pub analytics_scenario: Option<usize>,
    /// Present on visualization exercises: a chart is generated from the
    /// same prompt before it is graded.
    pub sales_data: Option<Vec<SalesRecord>>,
    pub language: Option<Language>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExerciseResponse {
    pub attempt_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
    pub evaluation: EvaluationResult,
    pub points_awarded: u32,
    pub attempts: u32,
    pub phase: AttemptPhase,
    pub evaluated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/exercises/submit
///
/// Runs one simulate + evaluate round trip. Upstream and parse failures do
/// not fail the request: they settle the attempt as failed with the canned
/// fallback evaluation.
pub async fn handle_submit_exercise(
    State(state): State<AppState>,
    payload: Result<Json<SubmitExerciseRequest>, JsonRejection>,
) -> Result<Json<SubmitExerciseResponse>, AppError> {
    let Json(request) = payload?;

    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    if request.criteria.trim().is_empty() {
        return Err(AppError::Validation("criteria cannot be empty".to_string()));
    }

    let mut context = LessonContext::new(request.scenario);
    context.documents = request.documents;
    if let Some(index) = request.analytics_scenario {
        let digest = state
            .scenarios
            .digest(index)
            .ok_or_else(|| AppError::NotFound(format!("analytics scenario {index}")))?;
        context = context.with_document(digest.document_title(), digest.dashboard_summary());
    }

    let chart = match &request.sales_data {
        Some(data) => {
            Some(generate_chart(&state.llm, &request.prompt, data, request.language).await)
        }
        None => None,
    };

    let submission = ExerciseSubmission {
        used_suggestion: used_suggestion(&request.prompt, &request.revealed_suggestions),
        prompt: request.prompt,
        context,
        criteria: request.criteria,
        enable_web_search: request.enable_web_search,
        language: request.language,
    };

    let attempt_id = Uuid::new_v4();
    info!(
        %attempt_id,
        attempts_so_far = request.attempts_so_far,
        documents = submission.context.documents.len(),
        "Submitting exercise"
    );

    let mut attempt = ExerciseAttempt::resume(request.attempts_so_far);
    let outcome = ExerciseRunner::new(&state.llm)
        .submit(&submission, &mut attempt)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(SubmitExerciseResponse {
        attempt_id,
        ai_response: outcome.ai_response,
        chart,
        evaluation: outcome.evaluation,
        points_awarded: outcome.points_awarded,
        attempts: attempt.attempts(),
        phase: attempt.phase(),
        evaluated_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::build_router;
    use crate::test_support::{app_state, spawn_mock_upstream, UpstreamScript};

    fn post_submit(body: &Value) -> Request<axum::body::Body> {
        Request::post("/api/exercises/submit")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn vacation_request(prompt: &str) -> Value {
        json!({
            "prompt": prompt,
            "scenario": "You need to ask your manager for vacation time.",
            "criteria": "specificity",
            "attemptsSoFar": 2
        })
    }

    #[tokio::test]
    async fn test_rejected_upstream_settles_failed_with_fallback() {
        let upstream = spawn_mock_upstream(UpstreamScript::Reject {
            status: 401,
            message: "invalid x-api-key".to_string(),
        })
        .await;
        let app = build_router(app_state(&upstream.base_url));

        let response = app
            .oneshot(post_submit(&vacation_request("Write an email")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["evaluation"]["passed"], false);
        assert_eq!(body["evaluation"]["score"], 0);
        assert_eq!(body["pointsAwarded"], 0);
        assert_eq!(body["attempts"], 3);
        assert_eq!(body["phase"], "settled-failed");
        assert!(body.get("aiResponse").is_none());
        assert!(body["attemptId"].is_string());
        assert!(body["evaluatedAt"].is_string());
        // Evaluation is skipped once the simulate call fails.
        assert_eq!(upstream.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_non_json_grade_falls_back() {
        // Both calls get the same prose reply, which cannot parse as a grade.
        let upstream =
            spawn_mock_upstream(UpstreamScript::fragments(&["Sure, ", "here you go."])).await;
        let app = build_router(app_state(&upstream.base_url));

        let response = app
            .oneshot(post_submit(&vacation_request("Write an email")))
            .await
            .unwrap();
        let body = json_body(response).await;

        assert_eq!(body["aiResponse"], "Sure, here you go.");
        assert_eq!(body["evaluation"]["passed"], false);
        assert_eq!(
            body["evaluation"]["nextSteps"],
            "Try resubmitting your answer."
        );
        assert_eq!(body["phase"], "settled-failed");

        let requests = upstream.requests().await;
        assert_eq!(requests.len(), 2);
        let grading_prompt = requests[1]["messages"][0]["content"].as_str().unwrap();
        assert!(grading_prompt.contains("AI's response to their prompt: \"Sure, here you go.\""));
    }

    #[tokio::test]
    async fn test_analytics_scenario_attached_to_context() {
        let upstream = spawn_mock_upstream(UpstreamScript::fragments(&["ok"])).await;
        let state = app_state(&upstream.base_url);
        let title = state.scenarios.digest(1).unwrap().document_title();
        let app = build_router(state);

        let mut request = vacation_request("Summarize the dashboard in 3 bullets");
        request["analyticsScenario"] = json!(1);
        app.oneshot(post_submit(&request)).await.unwrap();

        let requests = upstream.requests().await;
        let simulate_prompt = requests[0]["messages"][0]["content"].as_str().unwrap();
        assert!(simulate_prompt.contains(&format!("{title}:\nSALES: ")));
    }

    #[tokio::test]
    async fn test_visualization_exercise_charts_before_grading() {
        let upstream = spawn_mock_upstream(UpstreamScript::fragments(&["no chart here"])).await;
        let app = build_router(app_state(&upstream.base_url));

        let mut request = vacation_request("Make a chart");
        request["salesData"] = json!([{"quarter": "Q1 2024", "sales": 45000, "label": "Q1"}]);
        let response = app.oneshot(post_submit(&request)).await.unwrap();
        let body = json_body(response).await;

        assert_eq!(body["chart"]["title"], "Sales Data");
        let requests = upstream.requests().await;
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0]["max_tokens"], 1500);
        assert_eq!(requests[1]["max_tokens"], 800);
        assert_eq!(requests[2]["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn test_unknown_analytics_scenario_is_404() {
        let upstream = spawn_mock_upstream(UpstreamScript::fragments(&["ok"])).await;
        let app = build_router(app_state(&upstream.base_url));

        let mut request = vacation_request("Summarize");
        request["analyticsScenario"] = json!(999);
        let response = app.oneshot(post_submit(&request)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(upstream.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_prompt_is_400() {
        let app = build_router(app_state("http://127.0.0.1:9"));
        let response = app
            .oneshot(post_submit(&vacation_request("   ")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_criteria_is_400() {
        let app = build_router(app_state("http://127.0.0.1:9"));
        let response = app
            .oneshot(post_submit(&json!({"prompt": "p", "scenario": "s"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

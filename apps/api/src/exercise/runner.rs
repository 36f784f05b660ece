//! Exercise Runner: the two-call grading round trip.
//!
//! Flow: simulate (stream the "AI" answer to the learner's prompt, accumulate
//! it in full) → evaluate (grade prompt + answer against the rubric, strict
//! JSON) → settle the attempt → award points.
//!
//! The simulated answer must be complete before grading starts: it is an
//! input to the evaluation call.

use serde::Serialize;
use tracing::{info, warn};

use crate::exercise::context::{context_for_simulation, LessonContext};
use crate::exercise::prompts::{
    EVALUATE_MAX_TOKENS, EVALUATE_PROMPT_TEMPLATE, SIMULATE_MAX_TOKENS, SIMULATE_PROMPT_TEMPLATE,
};
use crate::exercise::scoring::award_points;
use crate::exercise::state::{ExerciseAttempt, TransitionError};
use crate::llm_client::prompts::{JSON_ONLY_FOOTER, JSON_ONLY_SYSTEM};
use crate::llm_client::structured::parse_or_fallback;
use crate::llm_client::{collect_text, ChatRelay, LlmError};
use crate::models::chat::{ChatRequest, Language};
use crate::models::evaluation::EvaluationResult;

/// Everything needed to grade one submission.
#[derive(Debug, Clone)]
pub struct ExerciseSubmission {
    pub prompt: String,
    pub context: LessonContext,
    /// Natural-language rubric, e.g. "breaking the task into steps".
    pub criteria: String,
    pub enable_web_search: bool,
    pub used_suggestion: bool,
    pub language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOutcome {
    /// `None` when the simulate step failed and grading was skipped.
    pub ai_response: Option<String>,
    pub evaluation: EvaluationResult,
    pub points_awarded: u32,
}

pub struct ExerciseRunner<'a> {
    relay: &'a dyn ChatRelay,
}

impl<'a> ExerciseRunner<'a> {
    pub fn new(relay: &'a dyn ChatRelay) -> Self {
        Self { relay }
    }

    /// The single-message meta-prompt for the simulate step.
    pub fn simulation_request(
        prompt: &str,
        context: &str,
        enable_web_search: bool,
        language: Option<Language>,
    ) -> ChatRequest {
        let context = context_for_simulation(context, prompt, enable_web_search);
        let content = SIMULATE_PROMPT_TEMPLATE
            .replace("{context}", &context)
            .replace("{user_prompt}", prompt);
        ChatRequest::single_user(content, SIMULATE_MAX_TOKENS).with_language(language)
    }

    pub fn evaluation_request(
        prompt: &str,
        ai_response: &str,
        criteria: &str,
        context: &str,
        language: Option<Language>,
    ) -> ChatRequest {
        // Learner-controlled text is substituted last so it cannot inject
        // into the other placeholders.
        let content = EVALUATE_PROMPT_TEMPLATE
            .replace("{json_only}", JSON_ONLY_FOOTER)
            .replace("{criteria}", criteria)
            .replace("{lesson_context}", context)
            .replace("{ai_response}", ai_response)
            .replace("{user_prompt}", prompt);
        let mut request =
            ChatRequest::single_user(content, EVALUATE_MAX_TOKENS).with_language(language);
        request.system = Some(JSON_ONLY_SYSTEM.to_string());
        request
    }

    /// Runs the simulate step and returns the fully accumulated response.
    /// `submit` opens the same call itself so it can track the attempt phase.
    #[allow(dead_code)]
    pub async fn simulate(
        &self,
        prompt: &str,
        context: &str,
        enable_web_search: bool,
        language: Option<Language>,
    ) -> Result<String, LlmError> {
        let request = Self::simulation_request(prompt, context, enable_web_search, language);
        self.relay.complete(&request).await
    }

    /// Grades a (prompt, response) pair. Never fails: transport errors,
    /// non-JSON output, missing fields and out-of-range scores all yield
    /// `EvaluationResult::fallback()`.
    pub async fn evaluate(
        &self,
        prompt: &str,
        ai_response: &str,
        criteria: &str,
        context: &str,
        language: Option<Language>,
    ) -> EvaluationResult {
        let request = Self::evaluation_request(prompt, ai_response, criteria, context, language);

        let raw = match self.relay.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Evaluation call failed, using fallback: {e}");
                return EvaluationResult::fallback();
            }
        };

        let result = parse_or_fallback(&raw, EvaluationResult::fallback);
        if result.is_well_formed() || result == EvaluationResult::fallback() {
            result
        } else {
            warn!(
                "Grade out of range (score={}), using fallback",
                result.score
            );
            EvaluationResult::fallback()
        }
    }

    /// Drives one submission from `idle` to `settled`. The attempt must be
    /// idle on entry; it is always settled on a successful return.
    pub async fn submit(
        &self,
        submission: &ExerciseSubmission,
        attempt: &mut ExerciseAttempt,
    ) -> Result<ExerciseOutcome, TransitionError> {
        attempt.begin_submission()?;
        let attempts_so_far = attempt.attempts();
        let context = submission.context.render();

        let request = Self::simulation_request(
            &submission.prompt,
            &context,
            submission.enable_web_search,
            submission.language,
        );

        let simulated = match self.relay.stream(&request).await {
            Ok(stream) => {
                attempt.start_streaming()?;
                collect_text(stream).await
            }
            Err(e) => Err(e),
        };

        let (ai_response, evaluation) = match simulated {
            Ok(ai_response) => {
                attempt.start_evaluating()?;
                let evaluation = self
                    .evaluate(
                        &submission.prompt,
                        &ai_response,
                        &submission.criteria,
                        &context,
                        submission.language,
                    )
                    .await;
                (Some(ai_response), evaluation)
            }
            Err(e) => {
                warn!("Simulate step failed, settling without evaluation: {e}");
                (None, EvaluationResult::fallback())
            }
        };

        attempt.settle(evaluation.passed)?;
        let points_awarded = award_points(
            attempts_so_far,
            evaluation.passed,
            submission.used_suggestion,
        );

        info!(
            "Exercise settled: passed={}, score={}, attempts={}, points={}",
            evaluation.passed,
            evaluation.score,
            attempt.attempts(),
            points_awarded
        );

        Ok(ExerciseOutcome {
            ai_response,
            evaluation,
            points_awarded,
        })
    }
}

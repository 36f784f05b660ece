use serde::{de, Deserialize, Deserializer, Serialize};

/// Rubric feedback produced by the grading call.
///
/// The upstream model decides `passed`/`score`; this type only guarantees
/// the shape. A score of 7 or more is meant to pass, but that is never
/// enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub passed: bool,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub main_feedback: String,
    pub highlights: Vec<String>,
    pub next_steps: String,
}

impl EvaluationResult {
    /// Substituted whenever grading fails for any reason, so callers always
    /// receive a complete result.
    pub fn fallback() -> Self {
        Self {
            passed: false,
            score: 0,
            strengths: Vec::new(),
            weaknesses: vec!["Error evaluating your prompt".to_string()],
            main_feedback: "There was an error evaluating your prompt. Please try again."
                .to_string(),
            highlights: Vec::new(),
            next_steps: "Try resubmitting your answer.".to_string(),
        }
    }

    /// Scores outside 1-10 do not match the grading schema.
    pub fn is_well_formed(&self) -> bool {
        (1..=10).contains(&self.score)
    }
}

/// Models sometimes write `8.0` for 8. Fractions are rounded; anything
/// outside 0..=255 is rejected as malformed.
fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let score = f64::deserialize(deserializer)?;
    let rounded = score.round();
    if !rounded.is_finite() || !(0.0..=f64::from(u8::MAX)).contains(&rounded) {
        return Err(de::Error::custom(format!("score {score} out of range")));
    }
    Ok(rounded as u8)
}

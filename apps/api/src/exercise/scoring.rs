//! Points awarded per settled submission. A caller-side business rule: the
//! relay and the grader know nothing about it.

pub const BASE_POINTS: u32 = 30;
pub const ATTEMPT_PENALTY: u32 = 5;
pub const MIN_POINTS: u32 = 10;
/// Using a revealed easy-mode suggestion verbatim keeps 1/10 of the points.
pub const SUGGESTION_DIVISOR: u32 = 10;

/// `max(30 - 5*attempts, 10)` on a pass, floored to a tenth if a suggestion
/// was used. A failed submission earns nothing.
pub fn award_points(attempts_so_far: u32, passed: bool, used_suggestion: bool) -> u32 {
    if !passed {
        return 0;
    }
    let points = BASE_POINTS
        .saturating_sub(ATTEMPT_PENALTY.saturating_mul(attempts_so_far))
        .max(MIN_POINTS);
    if used_suggestion {
        points / SUGGESTION_DIVISOR
    } else {
        points
    }
}

/// True when the submitted prompt is one of the revealed suggestions, word
/// for word (surrounding whitespace ignored).
pub fn used_suggestion(prompt: &str, revealed: &[String]) -> bool {
    let prompt = prompt.trim();
    revealed.iter().any(|s| s.trim() == prompt)
}

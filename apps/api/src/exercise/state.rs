//! Per-attempt state machine shared by graded and visualization exercises.
//!
//! ```text
//! idle -> submitting -> streaming-response -> evaluating -> settled(passed|failed)
//! settled(failed) --retry--> idle
//! settled(passed) --advance--> idle (next exercise, counter reset)
//! ```
//!
//! Failures short-circuit to `settled(failed)` from any in-flight phase, so
//! every submission settles exactly once.

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Idle,
    Submitting,
    StreamingResponse,
    Evaluating,
    Settled(Verdict),
}

impl AttemptPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptPhase::Idle => "idle",
            AttemptPhase::Submitting => "submitting",
            AttemptPhase::StreamingResponse => "streaming-response",
            AttemptPhase::Evaluating => "evaluating",
            AttemptPhase::Settled(Verdict::Passed) => "settled-passed",
            AttemptPhase::Settled(Verdict::Failed) => "settled-failed",
        }
    }

    fn in_flight(&self) -> bool {
        matches!(
            self,
            AttemptPhase::Submitting | AttemptPhase::StreamingResponse | AttemptPhase::Evaluating
        )
    }
}

impl std::fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AttemptPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {action} while {from}")]
pub struct TransitionError {
    pub from: AttemptPhase,
    pub action: &'static str,
}

/// One exercise's attempt history: the current phase and how many
/// submissions have settled so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseAttempt {
    phase: AttemptPhase,
    attempts: u32,
}

impl Default for ExerciseAttempt {
    fn default() -> Self {
        Self::resume(0)
    }
}

impl ExerciseAttempt {
    /// Picks up an exercise in `idle` with a counter kept elsewhere (the
    /// browser owns it between requests).
    pub fn resume(attempts_so_far: u32) -> Self {
        Self {
            phase: AttemptPhase::Idle,
            attempts: attempts_so_far,
        }
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn transition(
        &mut self,
        allowed: bool,
        to: AttemptPhase,
        action: &'static str,
    ) -> Result<(), TransitionError> {
        if !allowed {
            return Err(TransitionError {
                from: self.phase,
                action,
            });
        }
        self.phase = to;
        Ok(())
    }

    pub fn begin_submission(&mut self) -> Result<(), TransitionError> {
        let allowed = self.phase == AttemptPhase::Idle;
        self.transition(allowed, AttemptPhase::Submitting, "submit")
    }

    pub fn start_streaming(&mut self) -> Result<(), TransitionError> {
        let allowed = self.phase == AttemptPhase::Submitting;
        self.transition(allowed, AttemptPhase::StreamingResponse, "stream a response")
    }

    pub fn start_evaluating(&mut self) -> Result<(), TransitionError> {
        let allowed = self.phase == AttemptPhase::StreamingResponse;
        self.transition(allowed, AttemptPhase::Evaluating, "evaluate")
    }

    /// Settles the in-flight submission and counts it, pass or fail.
    pub fn settle(&mut self, passed: bool) -> Result<(), TransitionError> {
        let verdict = if passed {
            Verdict::Passed
        } else {
            Verdict::Failed
        };
        let allowed = self.phase.in_flight();
        self.transition(allowed, AttemptPhase::Settled(verdict), "settle")?;
        self.attempts = self.attempts.saturating_add(1);
        Ok(())
    }

    /// Explicit "Try Again" after a failed submission. The browser owns this
    /// step between requests.
    #[allow(dead_code)]
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        let allowed = self.phase == AttemptPhase::Settled(Verdict::Failed);
        self.transition(allowed, AttemptPhase::Idle, "retry")
    }

    /// Moves on to the next exercise; the attempt counter starts over.
    #[allow(dead_code)]
    pub fn advance(&mut self) -> Result<(), TransitionError> {
        let allowed = self.phase == AttemptPhase::Settled(Verdict::Passed);
        self.transition(allowed, AttemptPhase::Idle, "advance")?;
        self.attempts = 0;
        Ok(())
    }
}

// Exercise Runner: the simulate → evaluate round trip that grades a learner's
// prompt, plus the scoring rules and per-attempt state machine around it.

pub mod context;
pub mod handlers;
pub mod prompts;
pub mod runner;
pub mod scoring;
pub mod state;

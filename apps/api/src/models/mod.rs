pub mod chart;
pub mod chat;
pub mod evaluation;

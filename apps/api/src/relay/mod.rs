// Chat relay: the streaming proxy in front of the upstream model, and the
// client that reads it back.

pub mod client;
pub mod handlers;

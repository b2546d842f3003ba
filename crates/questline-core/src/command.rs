//! Command abstractions.
//!
//! Commands are plain data: the handler functions in each context's
//! application layer do the work. The trait exists so logging and event
//! metadata can treat all commands uniformly.

use uuid::Uuid;

/// Trait implemented by every command in the engine.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name identifying the command in logs and traces.
    fn command_type(&self) -> &'static str;

    /// Correlation ID propagated into every event the command produces.
    fn correlation_id(&self) -> Uuid;
}

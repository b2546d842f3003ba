//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots persisted with optimistic concurrency.
///
/// `version` is the last persisted version of the aggregate. Command methods
/// record uncommitted events without touching it; repositories compare it
/// against the stored version on save and persist `next_version()`.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the last persisted version.
    fn version(&self) -> i64;

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Returns the version this aggregate will have once its uncommitted
    /// events are persisted.
    fn next_version(&self) -> i64 {
        #[allow(clippy::cast_possible_wrap)]
        let pending = self.uncommitted_events().len() as i64;
        self.version() + pending
    }
}

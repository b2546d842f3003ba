//! Test publishers — mock `EventPublisher` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_core::publisher::{EventPublisher, OutboundEvent};

/// A publisher that records every published event and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<OutboundEvent>>,
}

impl RecordingPublisher {
    /// Creates an empty recording publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all events published so far, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError> {
        self.events.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

/// A publisher that always returns an infrastructure error. Useful for
/// checking that commands survive a failed fire-and-forget publish.
#[derive(Debug)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _events: &[OutboundEvent]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

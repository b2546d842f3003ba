//! Outbound event publishing.
//!
//! External collaborators — the scoring ledger and the activity feed — are
//! notified through this port after a command's state change has been
//! persisted. Publishing is fire-and-forget: a failed publish is logged and
//! never fails the command.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Wire representation of a domain event handed to consumers.
#[derive(Debug, Clone)]
pub struct OutboundEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for consumer routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate.
    pub sequence_number: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl OutboundEvent {
    /// Converts a domain event into its outbound representation.
    pub fn from_domain(event: &dyn DomainEvent) -> Self {
        let meta = event.metadata();
        Self {
            event_id: meta.event_id,
            aggregate_id: meta.aggregate_id,
            event_type: event.event_type().to_owned(),
            payload: event.to_payload(),
            sequence_number: meta.sequence_number,
            correlation_id: meta.correlation_id,
            causation_id: meta.causation_id,
            occurred_at: meta.occurred_at,
        }
    }
}

/// Port through which command handlers notify external consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Delivers a batch of events to consumers.
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError>;
}

/// Publishes outbound events, logging failures instead of propagating them.
pub async fn publish_best_effort(publisher: &dyn EventPublisher, events: &[OutboundEvent]) {
    if events.is_empty() {
        return;
    }
    if let Err(err) = publisher.publish(events).await {
        tracing::warn!(error = %err, count = events.len(), "outbound event publish failed");
    }
}

/// Publisher that logs every event through `tracing`.
///
/// The default sink when no feed or ledger consumer is wired up.
#[derive(Debug, Clone, Copy)]
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError> {
        for event in events {
            tracing::info!(
                event_type = %event.event_type,
                aggregate_id = %event.aggregate_id,
                sequence_number = event.sequence_number,
                "domain event"
            );
        }
        Ok(())
    }
}

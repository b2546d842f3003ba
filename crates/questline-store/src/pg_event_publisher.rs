//! `PostgreSQL` implementation of the `EventPublisher` trait.
//!
//! Appends outbound events to the `domain_events` table, where the scoring
//! ledger and activity feed consume them. Command handlers call it through
//! `publish_best_effort`, so a failed append never fails the command.

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_core::publisher::{EventPublisher, OutboundEvent};
use sqlx::PgPool;

use crate::infra;

/// PostgreSQL-backed event publisher.
#[derive(Debug, Clone)]
pub struct PgEventPublisher {
    pool: PgPool,
}

impl PgEventPublisher {
    /// Creates a new `PgEventPublisher`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventPublisher for PgEventPublisher {
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;
        for event in events {
            sqlx::query(
                "INSERT INTO domain_events
                     (event_id, aggregate_id, event_type, payload, sequence_number,
                      correlation_id, causation_id, occurred_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(event.event_id)
            .bind(event.aggregate_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event.sequence_number)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;
        }
        tx.commit().await.map_err(infra)
    }
}

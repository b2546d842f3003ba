//! Repository port for the Quest Definition Store context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::Quest;

/// Repository trait for loading and persisting quest definitions.
#[async_trait]
pub trait QuestRepository: Send + Sync {
    /// Loads a quest by its identifier.
    async fn find_by_id(&self, quest_id: Uuid) -> Result<Option<Quest>, DomainError>;

    /// Returns the quest whose [start, end] window contains `at`.
    ///
    /// When several windows overlap, the most recently started quest wins;
    /// implementations must apply that tie-break deterministically.
    async fn find_active(&self, at: DateTime<Utc>) -> Result<Option<Quest>, DomainError>;

    /// Persists a newly created quest.
    async fn insert(&self, quest: &Quest) -> Result<(), DomainError>;

    /// Persists quest state, failing with `ConcurrencyConflict` when the
    /// stored version does not match the aggregate's last loaded version.
    async fn save(&self, quest: &Quest) -> Result<(), DomainError>;
}

//! Repository port for the Quest Status Engine context.

use async_trait::async_trait;
use questline_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::QuestStatus;

/// Repository trait for loading and persisting quest statuses.
///
/// `insert` writes the whole progression tree (level statuses and question
/// statuses) in one atomic unit and enforces a uniqueness constraint on
/// (group, quest): a concurrent duplicate start must fail with
/// `AlreadyStarted` rather than leave a partially materialized tree.
/// `save` uses an optimistic version check, serializing mutations per
/// quest status.
#[async_trait]
pub trait QuestStatusRepository: Send + Sync {
    /// Loads a quest status by its identifier.
    async fn find_by_id(&self, status_id: Uuid) -> Result<Option<QuestStatus>, DomainError>;

    /// Loads the quest status for a (group, quest) pair, if any.
    async fn find_by_group_and_quest(
        &self,
        group_id: Uuid,
        quest_id: Uuid,
    ) -> Result<Option<QuestStatus>, DomainError>;

    /// Persists a newly materialized progression tree atomically.
    async fn insert(&self, status: &QuestStatus) -> Result<(), DomainError>;

    /// Persists status state, failing with `ConcurrencyConflict` when the
    /// stored version does not match the aggregate's last loaded version.
    async fn save(&self, status: &QuestStatus) -> Result<(), DomainError>;
}

//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Every variant is a local, recoverable condition surfaced to the caller;
/// none is fatal to the process.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A group lookup failed.
    #[error("group not found: {0}")]
    GroupNotFound(Uuid),

    /// A quest lookup failed.
    #[error("quest not found: {0}")]
    QuestNotFound(Uuid),

    /// A quest status lookup failed.
    #[error("quest status not found: {0}")]
    StatusNotFound(Uuid),

    /// A question status lookup inside a quest status failed.
    #[error("question status not found: {0}")]
    QuestionStatusNotFound(Uuid),

    /// A group already has a progression for the quest.
    #[error("group {group_id} has already started quest {quest_id}")]
    AlreadyStarted {
        /// The group attempting the duplicate start.
        group_id: Uuid,
        /// The quest that was already started.
        quest_id: Uuid,
    },

    /// An answer was submitted for a question that is not unlocked.
    #[error("question status {0} is not unlocked")]
    QuestionLocked(Uuid),

    /// A group operation targeted a player outside the group.
    #[error("player {player_id} is not a member of group {group_id}")]
    NotAMember {
        /// The group the operation targeted.
        group_id: Uuid,
        /// The player that is not a member.
        player_id: Uuid,
    },

    /// A group-creation conflict on the designated owner.
    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

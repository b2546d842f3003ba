//! Domain events for the Quest Status Engine context.
//!
//! `LevelCompleted` and `QuestCompleted` are the signals external
//! consumers care about: the scoring ledger credits the level bonus and
//! the activity feed announces completion. Both are delivered
//! fire-and-forget after persistence.

use questline_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a group starts a quest and the progression tree is
/// materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestStarted {
    /// The quest status identifier.
    pub status_id: Uuid,
    /// The group that started the quest.
    pub group_id: Uuid,
    /// The quest being progressed.
    pub quest_id: Uuid,
    /// Number of question statuses created.
    pub question_count: u32,
}

/// Emitted when an answer is recorded for an unlocked question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecorded {
    /// The quest status identifier.
    pub status_id: Uuid,
    /// The question status that became Answered.
    pub question_status_id: Uuid,
    /// Opaque reference to the answered question.
    pub question_id: Uuid,
    /// The level the question belongs to.
    pub level_id: Uuid,
}

/// Emitted when every question of a level has been answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelCompleted {
    /// The quest status identifier.
    pub status_id: Uuid,
    /// The completed level.
    pub level_id: Uuid,
    /// The group's status record for the completed level.
    pub level_status_id: Uuid,
    /// The completed level's pyramid index.
    pub level_index: u32,
    /// Bonus to credit through the scoring ledger.
    pub bonus: u32,
    /// The level whose questions were unlocked, if any.
    pub unlocked_level_id: Option<Uuid>,
}

/// Emitted when the last level of a quest completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestCompleted {
    /// The quest status identifier.
    pub status_id: Uuid,
    /// The group that finished the quest.
    pub group_id: Uuid,
    /// The finished quest.
    pub quest_id: Uuid,
    /// Total points accumulated over the whole quest.
    pub total_points: u32,
}

/// Event type identifier for [`QuestStarted`].
pub const QUEST_STARTED_EVENT_TYPE: &str = "quest_status.started";

/// Event type identifier for [`AnswerRecorded`].
pub const ANSWER_RECORDED_EVENT_TYPE: &str = "quest_status.answer_recorded";

/// Event type identifier for [`LevelCompleted`].
pub const LEVEL_COMPLETED_EVENT_TYPE: &str = "quest_status.level_completed";

/// Event type identifier for [`QuestCompleted`].
pub const QUEST_COMPLETED_EVENT_TYPE: &str = "quest_status.completed";

/// Event payload variants for the Quest Status Engine context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StatusEventKind {
    /// A progression tree has been materialized.
    QuestStarted(QuestStarted),
    /// An answer has been recorded.
    AnswerRecorded(AnswerRecorded),
    /// A level has completed.
    LevelCompleted(LevelCompleted),
    /// The whole quest has completed.
    QuestCompleted(QuestCompleted),
}

/// Domain event envelope for the Quest Status Engine context.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: StatusEventKind,
}

impl DomainEvent for StatusEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            StatusEventKind::QuestStarted(_) => QUEST_STARTED_EVENT_TYPE,
            StatusEventKind::AnswerRecorded(_) => ANSWER_RECORDED_EVENT_TYPE,
            StatusEventKind::LevelCompleted(_) => LEVEL_COMPLETED_EVENT_TYPE,
            StatusEventKind::QuestCompleted(_) => QUEST_COMPLETED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("StatusEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

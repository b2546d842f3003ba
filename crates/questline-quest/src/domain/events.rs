//! Domain events for the Quest Definition Store context.

use questline_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a quest is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestCreated {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// The quest title.
    pub title: String,
    /// The attached levels in index order.
    pub level_ids: Vec<Uuid>,
}

/// Emitted when a level is attached to an existing quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelAdded {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// The attached level.
    pub level_id: Uuid,
}

/// Emitted when a question reference is added to a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAdded {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// The level that gained a question.
    pub level_id: Uuid,
    /// The question reference.
    pub question_id: Uuid,
}

/// Emitted when a question reference is removed from a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRemoved {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// The level that lost a question.
    pub level_id: Uuid,
    /// The question reference.
    pub question_id: Uuid,
}

/// Event type identifier for [`QuestCreated`].
pub const QUEST_CREATED_EVENT_TYPE: &str = "quest.created";

/// Event type identifier for [`LevelAdded`].
pub const LEVEL_ADDED_EVENT_TYPE: &str = "quest.level_added";

/// Event type identifier for [`QuestionAdded`].
pub const QUESTION_ADDED_EVENT_TYPE: &str = "quest.question_added";

/// Event type identifier for [`QuestionRemoved`].
pub const QUESTION_REMOVED_EVENT_TYPE: &str = "quest.question_removed";

/// Event payload variants for the Quest Definition Store context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QuestEventKind {
    /// A quest has been registered.
    QuestCreated(QuestCreated),
    /// A level has been attached.
    LevelAdded(LevelAdded),
    /// A question reference has been added.
    QuestionAdded(QuestionAdded),
    /// A question reference has been removed.
    QuestionRemoved(QuestionRemoved),
}

/// Domain event envelope for the Quest Definition Store context.
#[derive(Debug, Clone)]
pub struct QuestEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: QuestEventKind,
}

impl DomainEvent for QuestEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            QuestEventKind::QuestCreated(_) => QUEST_CREATED_EVENT_TYPE,
            QuestEventKind::LevelAdded(_) => LEVEL_ADDED_EVENT_TYPE,
            QuestEventKind::QuestionAdded(_) => QUESTION_ADDED_EVENT_TYPE,
            QuestEventKind::QuestionRemoved(_) => QUESTION_REMOVED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("QuestEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

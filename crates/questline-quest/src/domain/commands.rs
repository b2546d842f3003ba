//! Commands for the Quest Definition Store context.

use chrono::{DateTime, Utc};
use questline_core::command::Command;
use uuid::Uuid;

/// Level definition carried by quest-authoring commands.
#[derive(Debug, Clone)]
pub struct NewLevel {
    /// Bonus points awarded for completing the level.
    pub bonus: u32,
    /// Opaque references into the external question bank.
    pub question_ids: Vec<Uuid>,
}

/// Command to register a quest with a fixed set of levels.
#[derive(Debug, Clone)]
pub struct CreateQuest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The quest title.
    pub title: String,
    /// Start of the availability window.
    pub start_time: DateTime<Utc>,
    /// End of the availability window.
    pub end_time: DateTime<Utc>,
    /// The levels, in any order; pyramid indices are assigned on creation.
    pub levels: Vec<NewLevel>,
}

impl Command for CreateQuest {
    fn command_type(&self) -> &'static str {
        "quest.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to attach a new level to an existing quest.
#[derive(Debug, Clone)]
pub struct AddLevel {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target quest.
    pub quest_id: Uuid,
    /// The level to attach.
    pub level: NewLevel,
}

impl Command for AddLevel {
    fn command_type(&self) -> &'static str {
        "quest.add_level"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a question reference to a level.
#[derive(Debug, Clone)]
pub struct AddQuestion {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target quest.
    pub quest_id: Uuid,
    /// The target level.
    pub level_id: Uuid,
    /// The question reference.
    pub question_id: Uuid,
}

impl Command for AddQuestion {
    fn command_type(&self) -> &'static str {
        "quest.add_question"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove a question reference from a level.
#[derive(Debug, Clone)]
pub struct RemoveQuestion {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target quest.
    pub quest_id: Uuid,
    /// The target level.
    pub level_id: Uuid,
    /// The question reference.
    pub question_id: Uuid,
}

impl Command for RemoveQuestion {
    fn command_type(&self) -> &'static str {
        "quest.remove_question"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

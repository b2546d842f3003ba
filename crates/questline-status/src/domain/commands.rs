//! Commands for the Quest Status Engine context.

use questline_core::command::Command;
use uuid::Uuid;

/// Command to start a quest for a group, materializing its progression
/// tree.
#[derive(Debug, Clone)]
pub struct StartQuest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The group starting the quest.
    pub group_id: Uuid,
    /// The quest to start.
    pub quest_id: Uuid,
}

impl Command for StartQuest {
    fn command_type(&self) -> &'static str {
        "quest_status.start_quest"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to record an answer for an unlocked question.
///
/// Answer correctness is judged by the external question bank before this
/// command is issued; the engine only records the state change and the
/// progress it produces.
#[derive(Debug, Clone)]
pub struct RecordAnswer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The quest status being progressed.
    pub status_id: Uuid,
    /// The question status being answered.
    pub question_status_id: Uuid,
}

impl Command for RecordAnswer {
    fn command_type(&self) -> &'static str {
        "quest_status.record_answer"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

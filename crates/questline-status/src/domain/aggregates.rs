//! Aggregate roots for the Quest Status Engine context.
//!
//! `QuestStatus` is the aggregate root and the unit of serialization: all
//! lock-state transitions and the completion cascade for one (group, quest)
//! progression happen inside it, guarded by the repository's optimistic
//! version check. Different progressions never block each other.

use std::fmt;
use std::str::FromStr;

use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::event::EventMetadata;
use questline_quest::domain::aggregates::Quest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{
    AnswerRecorded, LevelCompleted, QuestCompleted, QuestStarted, StatusEvent, StatusEventKind,
};

/// Visibility state of one question within a group's progression.
///
/// Transitions are strictly monotonic: Locked → Unlocked → Answered, no
/// backward moves, no skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    /// Invisible and unanswerable.
    Locked,
    /// Visible and answerable.
    Unlocked,
    /// Terminal: a correct answer has been recorded.
    Answered,
}

impl LockState {
    /// Stable string form used by the storage layer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Answered => "answered",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(Self::Locked),
            "unlocked" => Ok(Self::Unlocked),
            "answered" => Ok(Self::Answered),
            other => Err(DomainError::Infrastructure(format!(
                "unknown lock state: {other}"
            ))),
        }
    }
}

/// One group's progression record for a single question.
#[derive(Debug, Clone)]
pub struct QuestionStatus {
    /// The question status identifier.
    pub id: Uuid,
    /// Opaque reference into the external question bank.
    pub question_id: Uuid,
    /// Global index, unique and contiguous across the whole quest status.
    pub index: u32,
    /// Current visibility state.
    pub lock: LockState,
}

/// One group's progression record for a single level.
#[derive(Debug, Clone)]
pub struct LevelStatus {
    id: Uuid,
    level_id: Uuid,
    level_index: u32,
    bonus: u32,
    points_per_question: u32,
    questions: Vec<QuestionStatus>,
}

impl LevelStatus {
    /// Rehydrates a level status from persisted state.
    #[must_use]
    pub fn from_state(
        id: Uuid,
        level_id: Uuid,
        level_index: u32,
        bonus: u32,
        points_per_question: u32,
        questions: Vec<QuestionStatus>,
    ) -> Self {
        Self {
            id,
            level_id,
            level_index,
            bonus,
            points_per_question,
            questions,
        }
    }

    /// Returns the level status identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the tracked level's identifier.
    #[must_use]
    pub fn level_id(&self) -> Uuid {
        self.level_id
    }

    /// Returns the tracked level's pyramid index.
    #[must_use]
    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    /// Returns the level's bonus point value.
    #[must_use]
    pub fn bonus(&self) -> u32 {
        self.bonus
    }

    /// Points credited per answered question of this level.
    #[must_use]
    pub fn points_per_question(&self) -> u32 {
        self.points_per_question
    }

    /// Returns the question statuses in global index order.
    #[must_use]
    pub fn questions(&self) -> &[QuestionStatus] {
        &self.questions
    }

    /// True when every question of the level has been answered.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.questions
            .iter()
            .all(|question| question.lock == LockState::Answered)
    }

    /// The questions currently visible to the group: Unlocked or Answered.
    pub fn unlocked_questions(&self) -> impl Iterator<Item = &QuestionStatus> {
        self.questions
            .iter()
            .filter(|question| question.lock != LockState::Locked)
    }

    fn answered_count(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self
            .questions
            .iter()
            .filter(|question| question.lock == LockState::Answered)
            .count() as u32;
        count
    }

    fn unlock_all(&mut self) {
        for question in &mut self.questions {
            if question.lock == LockState::Locked {
                question.lock = LockState::Unlocked;
            }
        }
    }
}

/// Outcome of recording an answer.
#[derive(Debug, Clone, Copy)]
pub struct AnswerOutcome {
    /// The level that just completed, if any.
    pub completed_level_id: Option<Uuid>,
    /// The level whose questions were unlocked by the completion, if any.
    pub unlocked_level_id: Option<Uuid>,
    /// True when the whole quest is now complete for the group.
    pub quest_completed: bool,
}

/// The aggregate root for one group's progression through one quest.
#[derive(Debug)]
pub struct QuestStatus {
    id: Uuid,
    group_id: Uuid,
    quest_id: Uuid,
    levels: Vec<LevelStatus>,
    version: i64,
    uncommitted_events: Vec<StatusEvent>,
}

impl QuestStatus {
    /// Materializes the full progression tree for a (group, quest) pair.
    ///
    /// Levels are walked in index order; each question receives a global
    /// index from a running counter starting at 1, so indices are
    /// contiguous. Questions of the index-1 level start Unlocked, all
    /// others Locked.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the quest's level set does
    /// not satisfy the pyramid invariants.
    pub fn start(
        id: Uuid,
        group_id: Uuid,
        quest: &Quest,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        quest.validate_pyramid()?;

        let mut counter = 0u32;
        let levels: Vec<LevelStatus> = quest
            .levels()
            .iter()
            .map(|level| {
                let questions = level
                    .question_ids()
                    .iter()
                    .map(|question_id| {
                        counter += 1;
                        QuestionStatus {
                            id: Uuid::new_v4(),
                            question_id: *question_id,
                            index: counter,
                            lock: if level.index() == 1 {
                                LockState::Unlocked
                            } else {
                                LockState::Locked
                            },
                        }
                    })
                    .collect();
                LevelStatus {
                    id: Uuid::new_v4(),
                    level_id: level.id(),
                    level_index: level.index(),
                    bonus: level.bonus(),
                    points_per_question: level.points_per_question(),
                    questions,
                }
            })
            .collect();

        let mut status = Self {
            id,
            group_id,
            quest_id: quest.aggregate_id(),
            levels,
            version: 0,
            uncommitted_events: Vec::new(),
        };
        status.record(
            StatusEventKind::QuestStarted(QuestStarted {
                status_id: id,
                group_id,
                quest_id: quest.aggregate_id(),
                question_count: counter,
            }),
            correlation_id,
            clock,
        );
        Ok(status)
    }

    /// Rehydrates a quest status from persisted state. Levels must be in
    /// index order.
    #[must_use]
    pub fn from_state(
        id: Uuid,
        group_id: Uuid,
        quest_id: Uuid,
        levels: Vec<LevelStatus>,
        version: i64,
    ) -> Self {
        Self {
            id,
            group_id,
            quest_id,
            levels,
            version,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the owning group.
    #[must_use]
    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    /// Returns the quest being progressed.
    #[must_use]
    pub fn quest_id(&self) -> Uuid {
        self.quest_id
    }

    /// Returns the level statuses in level-index order.
    #[must_use]
    pub fn level_statuses(&self) -> &[LevelStatus] {
        &self.levels
    }

    /// The level status following the given one by index, or `None` for
    /// the last level.
    #[must_use]
    pub fn next_level(&self, level_status_id: Uuid) -> Option<&LevelStatus> {
        let current = self
            .levels
            .iter()
            .find(|level| level.id == level_status_id)?;
        let next_index = current.level_index + 1;
        self.levels
            .iter()
            .find(|level| level.level_index == next_index)
    }

    /// Sum over all answered questions of their level's
    /// points-per-question.
    #[must_use]
    pub fn progress(&self) -> u32 {
        self.levels
            .iter()
            .map(|level| level.points_per_question * level.answered_count())
            .sum()
    }

    /// Sum over all levels of points-per-question × question count; equal
    /// to the sum of the levels' bonus values.
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.levels
            .iter()
            .map(|level| {
                #[allow(clippy::cast_possible_truncation)]
                let count = level.questions.len() as u32;
                level.points_per_question * count
            })
            .sum()
    }

    /// True when every level of the quest has completed.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.levels.iter().all(LevelStatus::completed)
    }

    /// Records an answer for an unlocked question and runs the completion
    /// cascade: the question becomes Answered; if that completes its level,
    /// every question of the next level is unlocked, and completing the
    /// last level completes the quest.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::QuestionStatusNotFound` when the question
    /// status is not part of this progression, or
    /// `DomainError::QuestionLocked` when the question is not currently
    /// Unlocked (Locked and already-Answered submissions are both
    /// rejected).
    pub fn record_answer(
        &mut self,
        question_status_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<AnswerOutcome, DomainError> {
        let level_pos = self
            .levels
            .iter()
            .position(|level| {
                level
                    .questions
                    .iter()
                    .any(|question| question.id == question_status_id)
            })
            .ok_or(DomainError::QuestionStatusNotFound(question_status_id))?;

        let level_status_id = self.levels[level_pos].id;
        let level_id = self.levels[level_pos].level_id;
        let question = self.levels[level_pos]
            .questions
            .iter_mut()
            .find(|question| question.id == question_status_id)
            .ok_or(DomainError::QuestionStatusNotFound(question_status_id))?;

        if question.lock != LockState::Unlocked {
            return Err(DomainError::QuestionLocked(question_status_id));
        }
        question.lock = LockState::Answered;
        let question_id = question.question_id;

        self.record(
            StatusEventKind::AnswerRecorded(AnswerRecorded {
                status_id: self.id,
                question_status_id,
                question_id,
                level_id,
            }),
            correlation_id,
            clock,
        );

        if !self.levels[level_pos].completed() {
            return Ok(AnswerOutcome {
                completed_level_id: None,
                unlocked_level_id: None,
                quest_completed: false,
            });
        }

        let unlocked_level_id = {
            let next_index = self.levels[level_pos].level_index + 1;
            let next = self
                .levels
                .iter_mut()
                .find(|level| level.level_index == next_index);
            match next {
                Some(next_level) => {
                    next_level.unlock_all();
                    Some(next_level.level_id)
                }
                None => None,
            }
        };

        let completed_level = &self.levels[level_pos];
        self.record(
            StatusEventKind::LevelCompleted(LevelCompleted {
                status_id: self.id,
                level_id,
                level_status_id,
                level_index: completed_level.level_index,
                bonus: completed_level.bonus,
                unlocked_level_id,
            }),
            correlation_id,
            clock,
        );

        let quest_completed = self.completed();
        if quest_completed {
            self.record(
                StatusEventKind::QuestCompleted(QuestCompleted {
                    status_id: self.id,
                    group_id: self.group_id,
                    quest_id: self.quest_id,
                    total_points: self.total_points(),
                }),
                correlation_id,
                clock,
            );
        }

        Ok(AnswerOutcome {
            completed_level_id: Some(level_id),
            unlocked_level_id,
            quest_completed,
        })
    }

    fn record(&mut self, kind: StatusEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        #[allow(clippy::cast_possible_wrap)]
        let pending = self.uncommitted_events.len() as i64;
        let metadata = EventMetadata {
            event_id: Uuid::new_v4(),
            aggregate_id: self.id,
            sequence_number: self.version + pending + 1,
            correlation_id,
            causation_id: correlation_id,
            occurred_at: clock.now(),
        };
        self.uncommitted_events.push(StatusEvent { metadata, kind });
    }
}

impl AggregateRoot for QuestStatus {
    type Event = StatusEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

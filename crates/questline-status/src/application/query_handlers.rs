//! Query handlers for the Quest Status Engine context.
//!
//! Views flatten the progression tree for presentation: per-question lock
//! states, derived progress, and the unlocked-question listing a group sees
//! while playing.

use questline_core::aggregate::AggregateRoot;
use questline_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{LevelStatus, QuestStatus, QuestionStatus};
use crate::domain::repository::QuestStatusRepository;

/// Read-only view of one question's progression state.
#[derive(Debug, Serialize)]
pub struct QuestionStatusView {
    /// The question status identifier.
    pub question_status_id: Uuid,
    /// Opaque reference into the external question bank.
    pub question_id: Uuid,
    /// Global index within the quest status.
    pub index: u32,
    /// Current lock state, in its stable string form.
    pub lock: String,
}

/// Read-only view of one level's progression state.
#[derive(Debug, Serialize)]
pub struct LevelStatusView {
    /// The level status identifier.
    pub level_status_id: Uuid,
    /// The tracked level.
    pub level_id: Uuid,
    /// The tracked level's pyramid index.
    pub level_index: u32,
    /// Bonus credited when the level completes.
    pub bonus: u32,
    /// Points credited per answered question.
    pub points_per_question: u32,
    /// True when every question of the level is answered.
    pub completed: bool,
    /// Question statuses in global index order.
    pub questions: Vec<QuestionStatusView>,
}

/// Read-only view of a group's progression through a quest.
#[derive(Debug, Serialize)]
pub struct QuestStatusView {
    /// The quest status identifier.
    pub status_id: Uuid,
    /// The owning group.
    pub group_id: Uuid,
    /// The quest being progressed.
    pub quest_id: Uuid,
    /// Points accumulated so far.
    pub progress: u32,
    /// Points available over the whole quest.
    pub total_points: u32,
    /// True when every level has completed.
    pub completed: bool,
    /// Level statuses in level-index order.
    pub levels: Vec<LevelStatusView>,
    /// Current persisted version.
    pub version: i64,
}

impl QuestionStatusView {
    fn from_question(question: &QuestionStatus) -> Self {
        Self {
            question_status_id: question.id,
            question_id: question.question_id,
            index: question.index,
            lock: question.lock.as_str().to_owned(),
        }
    }
}

impl LevelStatusView {
    fn from_level(level: &LevelStatus) -> Self {
        Self {
            level_status_id: level.id(),
            level_id: level.level_id(),
            level_index: level.level_index(),
            bonus: level.bonus(),
            points_per_question: level.points_per_question(),
            completed: level.completed(),
            questions: level
                .questions()
                .iter()
                .map(QuestionStatusView::from_question)
                .collect(),
        }
    }
}

impl QuestStatusView {
    fn from_status(status: &QuestStatus) -> Self {
        Self {
            status_id: status.aggregate_id(),
            group_id: status.group_id(),
            quest_id: status.quest_id(),
            progress: status.progress(),
            total_points: status.total_points(),
            completed: status.completed(),
            levels: status
                .level_statuses()
                .iter()
                .map(LevelStatusView::from_level)
                .collect(),
            version: status.version(),
        }
    }
}

/// Retrieves a quest status by its identifier.
///
/// # Errors
///
/// Returns `DomainError::StatusNotFound` if no such status exists.
pub async fn get_status_by_id(
    status_id: Uuid,
    repo: &dyn QuestStatusRepository,
) -> Result<QuestStatusView, DomainError> {
    let status = repo
        .find_by_id(status_id)
        .await?
        .ok_or(DomainError::StatusNotFound(status_id))?;
    Ok(QuestStatusView::from_status(&status))
}

/// Retrieves a group's progression through a quest, or `None` when the
/// group has not started it.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the lookup fails.
pub async fn get_status_for_group(
    group_id: Uuid,
    quest_id: Uuid,
    repo: &dyn QuestStatusRepository,
) -> Result<Option<QuestStatusView>, DomainError> {
    let status = repo.find_by_group_and_quest(group_id, quest_id).await?;
    Ok(status.as_ref().map(QuestStatusView::from_status))
}

/// Lists the questions a group can currently see, across all levels:
/// every question that is Unlocked or Answered, in global index order.
///
/// # Errors
///
/// Returns `DomainError::StatusNotFound` if no such status exists.
pub async fn get_visible_questions(
    status_id: Uuid,
    repo: &dyn QuestStatusRepository,
) -> Result<Vec<QuestionStatusView>, DomainError> {
    let status = repo
        .find_by_id(status_id)
        .await?
        .ok_or(DomainError::StatusNotFound(status_id))?;
    let mut questions: Vec<QuestionStatusView> = status
        .level_statuses()
        .iter()
        .flat_map(LevelStatus::unlocked_questions)
        .map(QuestionStatusView::from_question)
        .collect();
    questions.sort_by_key(|question| question.index);
    Ok(questions)
}


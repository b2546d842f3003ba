//! Query handlers for the Quest Definition Store context.
//!
//! Includes the quest-availability query: a pure time-window lookup with no
//! mutable state of its own.

use chrono::{DateTime, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Level, Quest};
use crate::domain::repository::QuestRepository;

/// Read-only view of a level.
#[derive(Debug, Serialize)]
pub struct LevelView {
    /// The level identifier.
    pub level_id: Uuid,
    /// Pyramid index within the quest.
    pub index: u32,
    /// Bonus points for completing the level.
    pub bonus: u32,
    /// Points credited per answered question.
    pub points_per_question: u32,
    /// Opaque question references.
    pub question_ids: Vec<Uuid>,
}

/// Read-only view of a quest definition.
#[derive(Debug, Serialize)]
pub struct QuestView {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// The quest title.
    pub title: String,
    /// Start of the availability window.
    pub start_time: DateTime<Utc>,
    /// End of the availability window.
    pub end_time: DateTime<Utc>,
    /// Levels in index order.
    pub levels: Vec<LevelView>,
    /// Current persisted version.
    pub version: i64,
}

impl QuestView {
    fn from_quest(quest: &Quest) -> Self {
        Self {
            quest_id: quest.aggregate_id(),
            title: quest.title().to_owned(),
            start_time: quest.start_time(),
            end_time: quest.end_time(),
            levels: quest.levels().iter().map(LevelView::from_level).collect(),
            version: quest.version(),
        }
    }
}

impl LevelView {
    fn from_level(level: &Level) -> Self {
        Self {
            level_id: level.id(),
            index: level.index(),
            bonus: level.bonus(),
            points_per_question: level.points_per_question(),
            question_ids: level.question_ids().to_vec(),
        }
    }
}

/// Retrieves a quest by its identifier.
///
/// # Errors
///
/// Returns `DomainError::QuestNotFound` if no such quest exists.
pub async fn get_quest_by_id(
    quest_id: Uuid,
    repo: &dyn QuestRepository,
) -> Result<QuestView, DomainError> {
    let quest = repo
        .find_by_id(quest_id)
        .await?
        .ok_or(DomainError::QuestNotFound(quest_id))?;
    Ok(QuestView::from_quest(&quest))
}

/// Returns the currently active quest, if any: the quest whose
/// [start, end] window contains the clock's present moment. With
/// overlapping windows, the most recently started quest wins.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the lookup fails.
pub async fn get_current_quest(
    clock: &dyn Clock,
    repo: &dyn QuestRepository,
) -> Result<Option<QuestView>, DomainError> {
    let quest = repo.find_active(clock.now()).await?;
    Ok(quest.as_ref().map(QuestView::from_quest))
}


//! Command handlers for the Quest Definition Store context.

use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::publisher::{EventPublisher, OutboundEvent, publish_best_effort};
use uuid::Uuid;

use crate::domain::aggregates::{Level, Quest};
use crate::domain::commands::{AddLevel, AddQuestion, CreateQuest, RemoveQuestion};
use crate::domain::repository::QuestRepository;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct QuestCommandResult {
    /// The quest affected or created by the command.
    pub quest_id: Uuid,
    /// The events produced and published.
    pub events: Vec<OutboundEvent>,
}

fn outbound_events(quest: &Quest) -> Vec<OutboundEvent> {
    quest
        .uncommitted_events()
        .iter()
        .map(|event| OutboundEvent::from_domain(event))
        .collect()
}

/// Handles the `CreateQuest` command: registers a quest with its level set
/// and assigns pyramid indices. Does not start any progression.
///
/// # Errors
///
/// Returns `DomainError::Validation` when the time window or level set is
/// invalid.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(title = %command.title))]
pub async fn handle_create_quest(
    command: &CreateQuest,
    clock: &dyn Clock,
    repo: &dyn QuestRepository,
    publisher: &dyn EventPublisher,
) -> Result<QuestCommandResult, DomainError> {
    if command.title.trim().is_empty() {
        return Err(DomainError::Validation(
            "quest title must not be empty".into(),
        ));
    }

    let levels = command
        .levels
        .iter()
        .map(|level| Level::new(level.bonus, level.question_ids.clone()))
        .collect();

    let quest_id = Uuid::new_v4();
    let quest = Quest::create(
        quest_id,
        command.title.clone(),
        command.start_time,
        command.end_time,
        levels,
        command.correlation_id,
        clock,
    )?;

    let events = outbound_events(&quest);
    repo.insert(&quest).await?;
    publish_best_effort(publisher, &events).await;

    Ok(QuestCommandResult { quest_id, events })
}

/// Handles the `AddLevel` command: attaches a level to an existing quest
/// and reindexes all siblings.
///
/// # Errors
///
/// Returns `DomainError::QuestNotFound` if the quest does not exist, or
/// `DomainError::Validation` for an invalid level.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(quest_id = %command.quest_id))]
pub async fn handle_add_level(
    command: &AddLevel,
    clock: &dyn Clock,
    repo: &dyn QuestRepository,
    publisher: &dyn EventPublisher,
) -> Result<QuestCommandResult, DomainError> {
    let mut quest = repo
        .find_by_id(command.quest_id)
        .await?
        .ok_or(DomainError::QuestNotFound(command.quest_id))?;

    let level = Level::new(command.level.bonus, command.level.question_ids.clone());
    quest.add_level(level, command.correlation_id, clock)?;

    let events = outbound_events(&quest);
    repo.save(&quest).await?;
    publish_best_effort(publisher, &events).await;

    Ok(QuestCommandResult {
        quest_id: command.quest_id,
        events,
    })
}

/// Handles the `AddQuestion` command.
///
/// # Errors
///
/// Returns `DomainError::QuestNotFound` if the quest does not exist, or
/// `DomainError::Validation` when the level is not part of the quest.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(quest_id = %command.quest_id, level_id = %command.level_id))]
pub async fn handle_add_question(
    command: &AddQuestion,
    clock: &dyn Clock,
    repo: &dyn QuestRepository,
    publisher: &dyn EventPublisher,
) -> Result<QuestCommandResult, DomainError> {
    let mut quest = repo
        .find_by_id(command.quest_id)
        .await?
        .ok_or(DomainError::QuestNotFound(command.quest_id))?;

    quest.add_question(
        command.level_id,
        command.question_id,
        command.correlation_id,
        clock,
    )?;

    let events = outbound_events(&quest);
    repo.save(&quest).await?;
    publish_best_effort(publisher, &events).await;

    Ok(QuestCommandResult {
        quest_id: command.quest_id,
        events,
    })
}

/// Handles the `RemoveQuestion` command.
///
/// # Errors
///
/// Returns `DomainError::QuestNotFound` if the quest does not exist, or
/// `DomainError::Validation` when the level or question reference is
/// missing, or removing the question would empty the level.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(quest_id = %command.quest_id, level_id = %command.level_id))]
pub async fn handle_remove_question(
    command: &RemoveQuestion,
    clock: &dyn Clock,
    repo: &dyn QuestRepository,
    publisher: &dyn EventPublisher,
) -> Result<QuestCommandResult, DomainError> {
    let mut quest = repo
        .find_by_id(command.quest_id)
        .await?
        .ok_or(DomainError::QuestNotFound(command.quest_id))?;

    quest.remove_question(
        command.level_id,
        command.question_id,
        command.correlation_id,
        clock,
    )?;

    let events = outbound_events(&quest);
    repo.save(&quest).await?;
    publish_best_effort(publisher, &events).await;

    Ok(QuestCommandResult {
        quest_id: command.quest_id,
        events,
    })
}


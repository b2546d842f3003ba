//! Command handlers for the Quest Status Engine context.
//!
//! Handlers orchestrate the cascade: validate the group and quest, build or
//! load the progression tree, execute the transition, persist, publish.

use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::publisher::{EventPublisher, OutboundEvent, publish_best_effort};
use questline_group::domain::repository::GroupRepository;
use questline_quest::domain::repository::QuestRepository;
use uuid::Uuid;

use crate::domain::aggregates::{AnswerOutcome, QuestStatus};
use crate::domain::commands::{RecordAnswer, StartQuest};
use crate::domain::repository::QuestStatusRepository;

/// Result of a successfully handled `StartQuest` command.
#[derive(Debug)]
pub struct StartQuestResult {
    /// The newly created quest status.
    pub status_id: Uuid,
    /// The events produced and published.
    pub events: Vec<OutboundEvent>,
}

/// Result of a successfully handled `RecordAnswer` command.
#[derive(Debug)]
pub struct RecordAnswerResult {
    /// The quest status that was mutated.
    pub status_id: Uuid,
    /// What the answer triggered: level completion, unlocks, quest
    /// completion.
    pub outcome: AnswerOutcome,
    /// The events produced and published.
    pub events: Vec<OutboundEvent>,
}

fn outbound_events(status: &QuestStatus) -> Vec<OutboundEvent> {
    status
        .uncommitted_events()
        .iter()
        .map(|event| OutboundEvent::from_domain(event))
        .collect()
}

/// Handles the `StartQuest` command: materializes the full progression tree
/// for a (group, quest) pair in one atomic insert.
///
/// The duplicate check here is advisory; the repository's uniqueness
/// constraint on (group, quest) is what makes a concurrent duplicate start
/// fail instead of racing.
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` or `DomainError::QuestNotFound`
/// for dangling references, `DomainError::AlreadyStarted` when the group
/// already has a status for the quest, or `DomainError::Validation` when
/// the quest's level set violates the pyramid invariants.
#[tracing::instrument(skip_all, fields(group_id = %command.group_id, quest_id = %command.quest_id))]
pub async fn handle_start_quest(
    command: &StartQuest,
    clock: &dyn Clock,
    groups: &dyn GroupRepository,
    quests: &dyn QuestRepository,
    statuses: &dyn QuestStatusRepository,
    publisher: &dyn EventPublisher,
) -> Result<StartQuestResult, DomainError> {
    if groups.find_by_id(command.group_id).await?.is_none() {
        return Err(DomainError::GroupNotFound(command.group_id));
    }
    let quest = quests
        .find_by_id(command.quest_id)
        .await?
        .ok_or(DomainError::QuestNotFound(command.quest_id))?;

    if statuses
        .find_by_group_and_quest(command.group_id, command.quest_id)
        .await?
        .is_some()
    {
        return Err(DomainError::AlreadyStarted {
            group_id: command.group_id,
            quest_id: command.quest_id,
        });
    }

    let status_id = Uuid::new_v4();
    let status = QuestStatus::start(
        status_id,
        command.group_id,
        &quest,
        command.correlation_id,
        clock,
    )?;

    let events = outbound_events(&status);
    statuses.insert(&status).await?;
    tracing::info!(status_id = %status_id, "quest started");
    publish_best_effort(publisher, &events).await;

    Ok(StartQuestResult { status_id, events })
}

/// Handles the `RecordAnswer` command: transitions an unlocked question to
/// Answered and runs the completion cascade, unlocking the next level when
/// the question's level completes.
///
/// # Errors
///
/// Returns `DomainError::StatusNotFound` when the quest status does not
/// exist, `DomainError::QuestionStatusNotFound` for a dangling question
/// reference, or `DomainError::QuestionLocked` when the question is not
/// currently Unlocked.
#[tracing::instrument(skip_all, fields(status_id = %command.status_id, question_status_id = %command.question_status_id))]
pub async fn handle_record_answer(
    command: &RecordAnswer,
    clock: &dyn Clock,
    statuses: &dyn QuestStatusRepository,
    publisher: &dyn EventPublisher,
) -> Result<RecordAnswerResult, DomainError> {
    let mut status = statuses
        .find_by_id(command.status_id)
        .await?
        .ok_or(DomainError::StatusNotFound(command.status_id))?;

    let outcome = status.record_answer(command.question_status_id, command.correlation_id, clock)?;

    let events = outbound_events(&status);
    statuses.save(&status).await?;
    if let Some(level_id) = outcome.completed_level_id {
        tracing::info!(level_id = %level_id, quest_completed = outcome.quest_completed, "level completed");
    }
    publish_best_effort(publisher, &events).await;

    Ok(RecordAnswerResult {
        status_id: command.status_id,
        outcome,
        events,
    })
}


//! Command handlers for the Group Registry context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load the group, execute the command, persist
//! state, publish the resulting events.

use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::publisher::{EventPublisher, OutboundEvent, publish_best_effort};
use uuid::Uuid;

use crate::domain::aggregates::{Group, MemberRemoval};
use crate::domain::commands::{AddMember, CreateGroup, PromoteOwner, RemoveMember};
use crate::domain::repository::GroupRepository;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct GroupCommandResult {
    /// The group affected or created by the command.
    pub group_id: Uuid,
    /// The events produced and published.
    pub events: Vec<OutboundEvent>,
}

fn outbound_events(group: &Group) -> Vec<OutboundEvent> {
    group
        .uncommitted_events()
        .iter()
        .map(|event| OutboundEvent::from_domain(event))
        .collect()
}


/// Handles the `CreateGroup` command: the owner becomes the sole member of
/// a new group.
///
/// # Errors
///
/// Returns `DomainError::InvalidOwner` when the owner already owns a group
/// with the same name or already belongs to another group, or
/// `DomainError::Validation` when the name is empty.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(owner_id = %command.owner_id))]
pub async fn handle_create_group(
    command: &CreateGroup,
    clock: &dyn Clock,
    repo: &dyn GroupRepository,
    publisher: &dyn EventPublisher,
) -> Result<GroupCommandResult, DomainError> {
    if command.name.trim().is_empty() {
        return Err(DomainError::Validation(
            "group name must not be empty".into(),
        ));
    }
    if repo
        .find_by_owner_and_name(command.owner_id, &command.name)
        .await?
        .is_some()
    {
        return Err(DomainError::InvalidOwner(format!(
            "player {} already owns a group named {:?}",
            command.owner_id, command.name
        )));
    }
    if repo.find_by_member(command.owner_id).await?.is_some() {
        return Err(DomainError::InvalidOwner(format!(
            "player {} already belongs to a group",
            command.owner_id
        )));
    }

    let group_id = Uuid::new_v4();
    let group = Group::create(
        group_id,
        command.owner_id,
        command.name.clone(),
        command.title.clone(),
        command.correlation_id,
        clock,
    );

    let events = outbound_events(&group);
    repo.insert(&group).await?;
    publish_best_effort(publisher, &events).await;

    Ok(GroupCommandResult { group_id, events })
}

/// Handles the `AddMember` command: detaches the player from any group they
/// currently belong to, then adds them to the target group. Adding an
/// existing member is a no-op.
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` if the target group does not exist.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(group_id = %command.group_id, player_id = %command.player_id))]
pub async fn handle_add_member(
    command: &AddMember,
    clock: &dyn Clock,
    repo: &dyn GroupRepository,
    publisher: &dyn EventPublisher,
) -> Result<GroupCommandResult, DomainError> {
    let mut group = repo
        .find_by_id(command.group_id)
        .await?
        .ok_or(DomainError::GroupNotFound(command.group_id))?;

    if group.is_member(command.player_id) {
        return Ok(GroupCommandResult {
            group_id: command.group_id,
            events: Vec::new(),
        });
    }

    // A player belongs to at most one group, so joining detaches them from
    // their current group first (disbanding it if they own it). Both sides
    // of the move commit in one atomic unit.
    let current = repo.find_by_member(command.player_id).await?;
    let events = match current {
        Some(mut current) => {
            let outcome =
                current.remove_member(command.player_id, command.correlation_id, clock)?;
            group.add_member(command.player_id, command.correlation_id, clock);
            let mut events = outbound_events(&current);
            events.extend(outbound_events(&group));
            repo.save_move(&current, outcome, &group).await?;
            events
        }
        None => {
            group.add_member(command.player_id, command.correlation_id, clock);
            let events = outbound_events(&group);
            repo.save(&group).await?;
            events
        }
    };
    publish_best_effort(publisher, &events).await;

    Ok(GroupCommandResult {
        group_id: command.group_id,
        events,
    })
}

/// Handles the `RemoveMember` command. Removing a regular member shrinks the
/// group; removing the owner disbands it — every remaining member is freed
/// and the group is deleted.
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` if the group does not exist, or
/// `DomainError::NotAMember` if the player is not a member.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(group_id = %command.group_id, player_id = %command.player_id))]
pub async fn handle_remove_member(
    command: &RemoveMember,
    clock: &dyn Clock,
    repo: &dyn GroupRepository,
    publisher: &dyn EventPublisher,
) -> Result<GroupCommandResult, DomainError> {
    let mut group = repo
        .find_by_id(command.group_id)
        .await?
        .ok_or(DomainError::GroupNotFound(command.group_id))?;

    let outcome = group.remove_member(command.player_id, command.correlation_id, clock)?;
    let events = outbound_events(&group);
    match outcome {
        MemberRemoval::Removed => repo.save(&group).await?,
        MemberRemoval::Disbanded => {
            tracing::info!(group_id = %command.group_id, "group disbanded on owner removal");
            repo.delete(command.group_id).await?;
        }
    }
    publish_best_effort(publisher, &events).await;

    Ok(GroupCommandResult {
        group_id: command.group_id,
        events,
    })
}

/// Handles the `PromoteOwner` command: reassigns ownership to an existing
/// member, demoting the previous owner to a regular member.
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` if the group does not exist, or
/// `DomainError::NotAMember` if the player is not a member.
#[tracing::instrument(skip(command, clock, repo, publisher), fields(group_id = %command.group_id, player_id = %command.player_id))]
pub async fn handle_promote_owner(
    command: &PromoteOwner,
    clock: &dyn Clock,
    repo: &dyn GroupRepository,
    publisher: &dyn EventPublisher,
) -> Result<GroupCommandResult, DomainError> {
    let mut group = repo
        .find_by_id(command.group_id)
        .await?
        .ok_or(DomainError::GroupNotFound(command.group_id))?;

    group.promote_owner(command.player_id, command.correlation_id, clock)?;
    let events = outbound_events(&group);
    repo.save(&group).await?;
    publish_best_effort(publisher, &events).await;

    Ok(GroupCommandResult {
        group_id: command.group_id,
        events,
    })
}


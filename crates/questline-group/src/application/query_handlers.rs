//! Query handlers for the Group Registry context.
//!
//! Read-only lookups returning view DTOs. Player-to-group resolution goes
//! through the repository on every call; there is no process-wide cache.

use questline_core::aggregate::AggregateRoot;
use questline_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Group;
use crate::domain::repository::GroupRepository;

/// Read-only view of a group.
#[derive(Debug, Serialize)]
pub struct GroupView {
    /// The group identifier.
    pub group_id: Uuid,
    /// The group name.
    pub name: String,
    /// The group title.
    pub title: String,
    /// The owning player.
    pub owner_id: Uuid,
    /// Members in join order.
    pub member_ids: Vec<Uuid>,
    /// Current persisted version.
    pub version: i64,
}

impl GroupView {
    fn from_group(group: &Group) -> Self {
        Self {
            group_id: group.aggregate_id(),
            name: group.name().to_owned(),
            title: group.title().to_owned(),
            owner_id: group.owner_id(),
            member_ids: group.members().to_vec(),
            version: group.version(),
        }
    }
}

/// Retrieves a group by its identifier.
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` if no such group exists.
pub async fn get_group_by_id(
    group_id: Uuid,
    repo: &dyn GroupRepository,
) -> Result<GroupView, DomainError> {
    let group = repo
        .find_by_id(group_id)
        .await?
        .ok_or(DomainError::GroupNotFound(group_id))?;
    Ok(GroupView::from_group(&group))
}

/// Returns the group the player currently belongs to, if any.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the lookup fails.
pub async fn get_group_of_player(
    player_id: Uuid,
    repo: &dyn GroupRepository,
) -> Result<Option<GroupView>, DomainError> {
    let group = repo.find_by_member(player_id).await?;
    Ok(group.as_ref().map(GroupView::from_group))
}

/// Returns true if the player owns the given group.
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` if no such group exists.
pub async fn is_owner(
    group_id: Uuid,
    player_id: Uuid,
    repo: &dyn GroupRepository,
) -> Result<bool, DomainError> {
    let group = repo
        .find_by_id(group_id)
        .await?
        .ok_or(DomainError::GroupNotFound(group_id))?;
    Ok(group.is_owner(player_id))
}


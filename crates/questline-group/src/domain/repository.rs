//! Repository port for the Group Registry context.

use async_trait::async_trait;
use questline_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::{Group, MemberRemoval};

/// Repository trait for loading and persisting groups.
///
/// `find_by_member` is the registry's explicit membership query: callers
/// resolve a player's group through it on every request instead of relying
/// on a process-wide cache. Implementations back the single-group invariant
/// with a uniqueness constraint on the member relation, and `save` with an
/// optimistic version check so membership mutations are serialized per
/// group.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Loads a group by its identifier.
    async fn find_by_id(&self, group_id: Uuid) -> Result<Option<Group>, DomainError>;

    /// Returns the group the player currently belongs to, if any.
    async fn find_by_member(&self, player_id: Uuid) -> Result<Option<Group>, DomainError>;

    /// Returns the group with the given owner and name, if any.
    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Group>, DomainError>;

    /// Persists a newly created group.
    async fn insert(&self, group: &Group) -> Result<(), DomainError>;

    /// Persists group state, failing with `ConcurrencyConflict` when the
    /// stored version does not match the aggregate's last loaded version.
    async fn save(&self, group: &Group) -> Result<(), DomainError>;

    /// Persists a cross-group move in one atomic unit: the source group the
    /// player left (saved, or deleted when the move disbanded it) and the
    /// target group the player joined commit together. A version conflict
    /// on either side leaves both groups untouched, so an external observer
    /// never sees a half-applied move.
    async fn save_move(
        &self,
        source: &Group,
        removal: MemberRemoval,
        target: &Group,
    ) -> Result<(), DomainError>;

    /// Deletes a disbanded group and all its membership rows.
    async fn delete(&self, group_id: Uuid) -> Result<(), DomainError>;
}

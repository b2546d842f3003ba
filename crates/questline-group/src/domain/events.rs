//! Domain events for the Group Registry context.

use questline_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a group is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCreated {
    /// The group identifier.
    pub group_id: Uuid,
    /// The owning player.
    pub owner_id: Uuid,
    /// The group name.
    pub name: String,
}

/// Emitted when a player joins a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAdded {
    /// The group identifier.
    pub group_id: Uuid,
    /// The joining player.
    pub player_id: Uuid,
}

/// Emitted when a regular member leaves a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRemoved {
    /// The group identifier.
    pub group_id: Uuid,
    /// The leaving player.
    pub player_id: Uuid,
}

/// Emitted when ownership is reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerPromoted {
    /// The group identifier.
    pub group_id: Uuid,
    /// The demoted previous owner (stays a member).
    pub previous_owner_id: Uuid,
    /// The newly promoted owner.
    pub new_owner_id: Uuid,
}

/// Emitted when a group is destroyed because its owner was removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDisbanded {
    /// The group identifier.
    pub group_id: Uuid,
    /// Members whose group reference was freed.
    pub freed_member_ids: Vec<Uuid>,
}

/// Event type identifier for [`GroupCreated`].
pub const GROUP_CREATED_EVENT_TYPE: &str = "group.created";

/// Event type identifier for [`MemberAdded`].
pub const MEMBER_ADDED_EVENT_TYPE: &str = "group.member_added";

/// Event type identifier for [`MemberRemoved`].
pub const MEMBER_REMOVED_EVENT_TYPE: &str = "group.member_removed";

/// Event type identifier for [`OwnerPromoted`].
pub const OWNER_PROMOTED_EVENT_TYPE: &str = "group.owner_promoted";

/// Event type identifier for [`GroupDisbanded`].
pub const GROUP_DISBANDED_EVENT_TYPE: &str = "group.disbanded";

/// Event payload variants for the Group Registry context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEventKind {
    /// A group has been created.
    GroupCreated(GroupCreated),
    /// A player has joined a group.
    MemberAdded(MemberAdded),
    /// A regular member has left a group.
    MemberRemoved(MemberRemoved),
    /// Ownership has been reassigned.
    OwnerPromoted(OwnerPromoted),
    /// A group has been destroyed.
    GroupDisbanded(GroupDisbanded),
}

/// Domain event envelope for the Group Registry context.
#[derive(Debug, Clone)]
pub struct GroupEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: GroupEventKind,
}

impl DomainEvent for GroupEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            GroupEventKind::GroupCreated(_) => GROUP_CREATED_EVENT_TYPE,
            GroupEventKind::MemberAdded(_) => MEMBER_ADDED_EVENT_TYPE,
            GroupEventKind::MemberRemoved(_) => MEMBER_REMOVED_EVENT_TYPE,
            GroupEventKind::OwnerPromoted(_) => OWNER_PROMOTED_EVENT_TYPE,
            GroupEventKind::GroupDisbanded(_) => GROUP_DISBANDED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("GroupEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

//! Commands for the Group Registry context.

use questline_core::command::Command;
use uuid::Uuid;

/// Command to create a group with its initial owner.
#[derive(Debug, Clone)]
pub struct CreateGroup {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player who becomes owner and sole member.
    pub owner_id: Uuid,
    /// The group name.
    pub name: String,
    /// The group title.
    pub title: String,
}

impl Command for CreateGroup {
    fn command_type(&self) -> &'static str {
        "group.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a player to a group.
#[derive(Debug, Clone)]
pub struct AddMember {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target group.
    pub group_id: Uuid,
    /// The player to add.
    pub player_id: Uuid,
}

impl Command for AddMember {
    fn command_type(&self) -> &'static str {
        "group.add_member"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove a player from a group.
///
/// Removing the owner disbands the group; no ownership transfer happens
/// automatically.
#[derive(Debug, Clone)]
pub struct RemoveMember {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target group.
    pub group_id: Uuid,
    /// The player to remove.
    pub player_id: Uuid,
}

impl Command for RemoveMember {
    fn command_type(&self) -> &'static str {
        "group.remove_member"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to reassign group ownership to an existing member.
#[derive(Debug, Clone)]
pub struct PromoteOwner {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target group.
    pub group_id: Uuid,
    /// The member to promote.
    pub player_id: Uuid,
}

impl Command for PromoteOwner {
    fn command_type(&self) -> &'static str {
        "group.promote_owner"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

//! Aggregate roots for the Group Registry context.

use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    GroupCreated, GroupDisbanded, GroupEvent, GroupEventKind, MemberAdded, MemberRemoved,
    OwnerPromoted,
};

/// Outcome of removing a member from a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRemoval {
    /// A regular member left; the group survives.
    Removed,
    /// The owner left; the group must be deleted.
    Disbanded,
}

/// The aggregate root for a player group.
///
/// Invariant: the owner is always a member. The single-group invariant
/// (a player belongs to at most one group) is enforced by the registry's
/// command handlers, not by the aggregate itself.
#[derive(Debug)]
pub struct Group {
    id: Uuid,
    name: String,
    title: String,
    owner_id: Uuid,
    members: Vec<Uuid>,
    version: i64,
    uncommitted_events: Vec<GroupEvent>,
}

impl Group {
    /// Creates a new group with the given owner as its sole member.
    #[must_use]
    pub fn create(
        id: Uuid,
        owner_id: Uuid,
        name: String,
        title: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Self {
        let mut group = Self {
            id,
            name: name.clone(),
            title,
            owner_id,
            members: vec![owner_id],
            version: 0,
            uncommitted_events: Vec::new(),
        };
        group.record(
            GroupEventKind::GroupCreated(GroupCreated {
                group_id: id,
                owner_id,
                name,
            }),
            correlation_id,
            clock,
        );
        group
    }

    /// Rehydrates a group from persisted state.
    #[must_use]
    pub fn from_state(
        id: Uuid,
        name: String,
        title: String,
        owner_id: Uuid,
        members: Vec<Uuid>,
        version: i64,
    ) -> Self {
        Self {
            id,
            name,
            title,
            owner_id,
            members,
            version,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the group title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the owning player.
    #[must_use]
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// Returns the members in join order.
    #[must_use]
    pub fn members(&self) -> &[Uuid] {
        &self.members
    }

    /// Returns true if the player is a member of this group.
    #[must_use]
    pub fn is_member(&self, player_id: Uuid) -> bool {
        self.members.contains(&player_id)
    }

    /// Returns true if the player owns this group.
    #[must_use]
    pub fn is_owner(&self, player_id: Uuid) -> bool {
        self.owner_id == player_id
    }

    /// Adds a player to the group. Returns false (and records nothing) when
    /// the player is already a member.
    pub fn add_member(&mut self, player_id: Uuid, correlation_id: Uuid, clock: &dyn Clock) -> bool {
        if self.is_member(player_id) {
            return false;
        }
        self.members.push(player_id);
        self.record(
            GroupEventKind::MemberAdded(MemberAdded {
                group_id: self.id,
                player_id,
            }),
            correlation_id,
            clock,
        );
        true
    }

    /// Removes a player from the group.
    ///
    /// Removing the owner disbands the group: every remaining member is
    /// freed and the caller must delete the group. Ownership is never
    /// transferred automatically.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAMember` if the player is not a member.
    pub fn remove_member(
        &mut self,
        player_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<MemberRemoval, DomainError> {
        if !self.is_member(player_id) {
            return Err(DomainError::NotAMember {
                group_id: self.id,
                player_id,
            });
        }

        if self.is_owner(player_id) {
            let freed: Vec<Uuid> = self
                .members
                .iter()
                .copied()
                .filter(|id| *id != player_id)
                .collect();
            self.members.clear();
            self.record(
                GroupEventKind::GroupDisbanded(GroupDisbanded {
                    group_id: self.id,
                    freed_member_ids: freed,
                }),
                correlation_id,
                clock,
            );
            return Ok(MemberRemoval::Disbanded);
        }

        self.members.retain(|id| *id != player_id);
        self.record(
            GroupEventKind::MemberRemoved(MemberRemoved {
                group_id: self.id,
                player_id,
            }),
            correlation_id,
            clock,
        );
        Ok(MemberRemoval::Removed)
    }

    /// Reassigns ownership to an existing member. The previous owner stays
    /// in the group as a regular member.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAMember` if the player is not a member.
    pub fn promote_owner(
        &mut self,
        player_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.is_member(player_id) {
            return Err(DomainError::NotAMember {
                group_id: self.id,
                player_id,
            });
        }
        if self.owner_id == player_id {
            return Ok(());
        }
        let previous_owner_id = self.owner_id;
        self.owner_id = player_id;
        self.record(
            GroupEventKind::OwnerPromoted(OwnerPromoted {
                group_id: self.id,
                previous_owner_id,
                new_owner_id: player_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    fn record(&mut self, kind: GroupEventKind, correlation_id: Uuid, clock: &dyn Clock) {
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
        self.uncommitted_events.push(GroupEvent { metadata, kind });
    }
}

impl AggregateRoot for Group {
    type Event = GroupEvent;

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

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use questline_core::clock::Clock;
    use uuid::Uuid;

    use super::{Group, MemberRemoval};

    struct TestClock;

    impl Clock for TestClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        }
    }

    fn make_group(owner_id: Uuid) -> Group {
        Group::create(
            Uuid::new_v4(),
            owner_id,
            "rangers".to_owned(),
            "The Rangers".to_owned(),
            Uuid::new_v4(),
            &TestClock,
        )
    }

    #[test]
    fn test_create_makes_owner_sole_member() {
        let owner_id = Uuid::new_v4();
        let group = make_group(owner_id);

        assert!(group.is_owner(owner_id));
        assert_eq!(group.members(), &[owner_id]);
    }

    #[test]
    fn test_add_member_is_noop_for_existing_member() {
        let owner_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let mut group = make_group(owner_id);

        assert!(group.add_member(player_id, Uuid::new_v4(), &TestClock));
        assert!(!group.add_member(player_id, Uuid::new_v4(), &TestClock));
        assert_eq!(group.members().len(), 2);
    }

    #[test]
    fn test_remove_owner_disbands_and_frees_members() {
        let owner_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let mut group = make_group(owner_id);
        group.add_member(player_id, Uuid::new_v4(), &TestClock);

        let outcome = group
            .remove_member(owner_id, Uuid::new_v4(), &TestClock)
            .unwrap();

        assert_eq!(outcome, MemberRemoval::Disbanded);
        assert!(group.members().is_empty());
    }

    #[test]
    fn test_remove_regular_member_keeps_group() {
        let owner_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let mut group = make_group(owner_id);
        group.add_member(player_id, Uuid::new_v4(), &TestClock);

        let outcome = group
            .remove_member(player_id, Uuid::new_v4(), &TestClock)
            .unwrap();

        assert_eq!(outcome, MemberRemoval::Removed);
        assert_eq!(group.members(), &[owner_id]);
    }

    #[test]
    fn test_promote_owner_keeps_previous_owner_as_member() {
        let owner_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let mut group = make_group(owner_id);
        group.add_member(player_id, Uuid::new_v4(), &TestClock);

        group
            .promote_owner(player_id, Uuid::new_v4(), &TestClock)
            .unwrap();

        assert!(group.is_owner(player_id));
        assert!(group.is_member(owner_id));
    }

    #[test]
    fn test_promote_non_member_fails() {
        let owner_id = Uuid::new_v4();
        let mut group = make_group(owner_id);

        let result = group.promote_owner(Uuid::new_v4(), Uuid::new_v4(), &TestClock);

        assert!(result.is_err());
    }
}

use chrono::{TimeZone, Utc};
use questline_core::error::DomainError;
use uuid::Uuid;

use questline_group::application::command_handlers::{
    handle_add_member, handle_create_group, handle_promote_owner, handle_remove_member,
};
use questline_group::domain::commands::{AddMember, CreateGroup, PromoteOwner, RemoveMember};
use questline_group::domain::repository::GroupRepository;
use questline_test_support::{FixedClock, InMemoryGroupRepository, RecordingPublisher};

fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

async fn create_group(
    repo: &InMemoryGroupRepository,
    owner_id: Uuid,
    name: &str,
) -> Uuid {
    let command = CreateGroup {
        correlation_id: Uuid::new_v4(),
        owner_id,
        name: name.to_owned(),
        title: name.to_owned(),
    };
    handle_create_group(&command, &fixed_clock(), repo, &RecordingPublisher::new())
        .await
        .unwrap()
        .group_id
}

#[tokio::test]
async fn test_handle_create_group_makes_owner_sole_member() {
    // Arrange
    let owner_id = Uuid::new_v4();
    let repo = InMemoryGroupRepository::new();
    let publisher = RecordingPublisher::new();

    let command = CreateGroup {
        correlation_id: Uuid::new_v4(),
        owner_id,
        name: "rangers".to_owned(),
        title: "The Rangers".to_owned(),
    };

    // Act
    let result = handle_create_group(&command, &fixed_clock(), &repo, &publisher).await;

    // Assert
    let cmd_result = result.unwrap();
    let group = repo.get(cmd_result.group_id).unwrap();
    assert!(group.is_owner(owner_id));
    assert_eq!(group.members(), &[owner_id]);

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].event_type, "group.created");
}

#[tokio::test]
async fn test_handle_create_group_rejects_duplicate_name_for_same_owner() {
    // Arrange
    let owner_id = Uuid::new_v4();
    let repo = InMemoryGroupRepository::new();
    create_group(&repo, owner_id, "rangers").await;

    let command = CreateGroup {
        correlation_id: Uuid::new_v4(),
        owner_id,
        name: "rangers".to_owned(),
        title: "The Rangers".to_owned(),
    };

    // Act
    let result =
        handle_create_group(&command, &fixed_clock(), &repo, &RecordingPublisher::new()).await;

    // Assert
    match result.unwrap_err() {
        DomainError::InvalidOwner(_) => {}
        other => panic!("expected InvalidOwner, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handle_create_group_rejects_owner_who_belongs_to_another_group() {
    // Arrange: the would-be owner is a regular member elsewhere.
    let repo = InMemoryGroupRepository::new();
    let player_id = Uuid::new_v4();
    let existing_group = create_group(&repo, Uuid::new_v4(), "existing").await;
    let join = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id: existing_group,
        player_id,
    };
    handle_add_member(&join, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    let command = CreateGroup {
        correlation_id: Uuid::new_v4(),
        owner_id: player_id,
        name: "breakaway".to_owned(),
        title: "Breakaway".to_owned(),
    };

    // Act
    let result =
        handle_create_group(&command, &fixed_clock(), &repo, &RecordingPublisher::new()).await;

    // Assert: creating a group is rejected rather than auto-detaching;
    // joining an existing group is the only move path. The current
    // membership is untouched.
    match result.unwrap_err() {
        DomainError::InvalidOwner(_) => {}
        other => panic!("expected InvalidOwner, got {other:?}"),
    }
    assert!(repo.get(existing_group).unwrap().is_member(player_id));
}

#[tokio::test]
async fn test_handle_add_member_moves_player_between_groups() {
    // Arrange
    let repo = InMemoryGroupRepository::new();
    let publisher = RecordingPublisher::new();
    let player_id = Uuid::new_v4();
    let first_group = create_group(&repo, Uuid::new_v4(), "first").await;
    let second_group = create_group(&repo, Uuid::new_v4(), "second").await;

    let join_first = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id: first_group,
        player_id,
    };
    handle_add_member(&join_first, &fixed_clock(), &repo, &publisher)
        .await
        .unwrap();

    let join_second = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id: second_group,
        player_id,
    };

    // Act
    handle_add_member(&join_second, &fixed_clock(), &repo, &publisher)
        .await
        .unwrap();

    // Assert: exclusive membership — the player left the first group.
    assert!(!repo.get(first_group).unwrap().is_member(player_id));
    assert!(repo.get(second_group).unwrap().is_member(player_id));
}

#[tokio::test]
async fn test_cross_group_move_leaves_both_groups_intact_on_conflict() {
    // Arrange: the player owns a group; the target group advances past
    // the version a stale move was prepared against.
    let repo = InMemoryGroupRepository::new();
    let player_id = Uuid::new_v4();
    let owned_group = create_group(&repo, player_id, "first").await;
    let target_group = create_group(&repo, Uuid::new_v4(), "second").await;

    let mut stale_target = repo.get(target_group).unwrap();
    let concurrent_join = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id: target_group,
        player_id: Uuid::new_v4(),
    };
    handle_add_member(&concurrent_join, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    let mut source = repo.get(owned_group).unwrap();
    let outcome = source
        .remove_member(player_id, Uuid::new_v4(), &fixed_clock())
        .unwrap();
    stale_target.add_member(player_id, Uuid::new_v4(), &fixed_clock());

    // Act
    let result = repo.save_move(&source, outcome, &stale_target).await;

    // Assert: the conflict surfaces and neither side of the move was
    // applied — the owned group still exists with its owner, and the
    // player never appeared in the target group.
    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict { .. })
    ));
    assert!(repo.get(owned_group).unwrap().is_member(player_id));
    assert!(!repo.get(target_group).unwrap().is_member(player_id));
}

#[tokio::test]
async fn test_handle_add_member_is_noop_for_existing_member() {
    // Arrange
    let repo = InMemoryGroupRepository::new();
    let owner_id = Uuid::new_v4();
    let group_id = create_group(&repo, owner_id, "rangers").await;

    let command = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: owner_id,
    };

    // Act
    let result =
        handle_add_member(&command, &fixed_clock(), &repo, &RecordingPublisher::new()).await;

    // Assert
    assert!(result.unwrap().events.is_empty());
    assert_eq!(repo.get(group_id).unwrap().members().len(), 1);
}

#[tokio::test]
async fn test_handle_add_member_disbands_group_owned_by_joining_player() {
    // Arrange
    let repo = InMemoryGroupRepository::new();
    let owner_id = Uuid::new_v4();
    let owned_group = create_group(&repo, owner_id, "solo").await;
    let target_group = create_group(&repo, Uuid::new_v4(), "target").await;

    let command = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id: target_group,
        player_id: owner_id,
    };

    // Act
    handle_add_member(&command, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    // Assert: the owned group was disbanded, not orphaned.
    assert!(repo.get(owned_group).is_none());
    assert!(repo.get(target_group).unwrap().is_member(owner_id));
}

#[tokio::test]
async fn test_handle_add_member_returns_error_when_group_not_found() {
    // Arrange
    let repo = InMemoryGroupRepository::new();
    let group_id = Uuid::new_v4();

    let command = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: Uuid::new_v4(),
    };

    // Act
    let result =
        handle_add_member(&command, &fixed_clock(), &repo, &RecordingPublisher::new()).await;

    // Assert
    match result.unwrap_err() {
        DomainError::GroupNotFound(id) => assert_eq!(id, group_id),
        other => panic!("expected GroupNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handle_remove_member_owner_removal_destroys_group() {
    // Arrange
    let repo = InMemoryGroupRepository::new();
    let publisher = RecordingPublisher::new();
    let owner_id = Uuid::new_v4();
    let member_id = Uuid::new_v4();
    let group_id = create_group(&repo, owner_id, "rangers").await;

    let join = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: member_id,
    };
    handle_add_member(&join, &fixed_clock(), &repo, &publisher)
        .await
        .unwrap();

    let command = RemoveMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: owner_id,
    };

    // Act
    let result = handle_remove_member(&command, &fixed_clock(), &repo, &publisher).await;

    // Assert: group gone, remaining member freed.
    result.unwrap();
    assert!(repo.get(group_id).is_none());
    assert!(repo.group_of(member_id).is_none());

    let published = publisher.published();
    assert_eq!(published.last().unwrap().event_type, "group.disbanded");
}

#[tokio::test]
async fn test_handle_remove_member_regular_member_keeps_group() {
    // Arrange
    let repo = InMemoryGroupRepository::new();
    let owner_id = Uuid::new_v4();
    let member_id = Uuid::new_v4();
    let group_id = create_group(&repo, owner_id, "rangers").await;

    let join = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: member_id,
    };
    handle_add_member(&join, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    let command = RemoveMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: member_id,
    };

    // Act
    handle_remove_member(&command, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    // Assert
    let group = repo.get(group_id).unwrap();
    assert!(group.is_owner(owner_id));
    assert!(!group.is_member(member_id));
}

#[tokio::test]
async fn test_handle_promote_owner_then_remove_previous_owner() {
    // Arrange: group with owner A, member B.
    let repo = InMemoryGroupRepository::new();
    let player_a = Uuid::new_v4();
    let player_b = Uuid::new_v4();
    let group_id = create_group(&repo, player_a, "rangers").await;

    let join = AddMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: player_b,
    };
    handle_add_member(&join, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    // Act: promote B, then remove A.
    let promote = PromoteOwner {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: player_b,
    };
    handle_promote_owner(&promote, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    let remove = RemoveMember {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: player_a,
    };
    handle_remove_member(&remove, &fixed_clock(), &repo, &RecordingPublisher::new())
        .await
        .unwrap();

    // Assert: group survives under B; A has no group.
    let group = repo.get(group_id).unwrap();
    assert!(group.is_owner(player_b));
    assert!(!group.is_member(player_a));
    assert!(repo.group_of(player_a).is_none());
}

#[tokio::test]
async fn test_handle_promote_owner_returns_error_for_non_member() {
    // Arrange
    let repo = InMemoryGroupRepository::new();
    let group_id = create_group(&repo, Uuid::new_v4(), "rangers").await;
    let outsider_id = Uuid::new_v4();

    let command = PromoteOwner {
        correlation_id: Uuid::new_v4(),
        group_id,
        player_id: outsider_id,
    };

    // Act
    let result =
        handle_promote_owner(&command, &fixed_clock(), &repo, &RecordingPublisher::new()).await;

    // Assert
    match result.unwrap_err() {
        DomainError::NotAMember { player_id, .. } => assert_eq!(player_id, outsider_id),
        other => panic!("expected NotAMember, got {other:?}"),
    }
}

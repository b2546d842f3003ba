use chrono::{TimeZone, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_core::error::DomainError;
use questline_group::domain::aggregates::Group;
use questline_group::domain::repository::GroupRepository;
use questline_quest::domain::aggregates::{Level, Quest};
use questline_quest::domain::repository::QuestRepository;
use uuid::Uuid;

use questline_status::application::command_handlers::{handle_record_answer, handle_start_quest};
use questline_status::domain::aggregates::LockState;
use questline_status::domain::commands::{RecordAnswer, StartQuest};
use questline_test_support::{
    FailingPublisher, FixedClock, InMemoryGroupRepository, InMemoryQuestRepository,
    InMemoryQuestStatusRepository, RecordingPublisher,
};

fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

async fn seed_group(groups: &InMemoryGroupRepository) -> Uuid {
    let group = Group::create(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "rangers".to_owned(),
        "The Rangers".to_owned(),
        Uuid::new_v4(),
        &fixed_clock(),
    );
    let id = group.aggregate_id();
    groups.insert(&group).await.unwrap();
    id
}

/// Seeds a quest with levels sized 3, 2, 1 carrying `bonus` each.
async fn seed_pyramid_quest(quests: &InMemoryQuestRepository, bonus: u32) -> Uuid {
    let levels = (0..3)
        .map(|i| Level::new(bonus, (0..3 - i).map(|_| Uuid::new_v4()).collect()))
        .collect();
    let quest = Quest::create(
        Uuid::new_v4(),
        "trial".to_owned(),
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        levels,
        Uuid::new_v4(),
        &fixed_clock(),
    )
    .unwrap();
    let id = quest.aggregate_id();
    quests.insert(&quest).await.unwrap();
    id
}

struct Scenario {
    groups: InMemoryGroupRepository,
    quests: InMemoryQuestRepository,
    statuses: InMemoryQuestStatusRepository,
    publisher: RecordingPublisher,
    group_id: Uuid,
    quest_id: Uuid,
}

/// Group + [3, 2, 1] quest with bonus 30 per level, quest started.
async fn started_scenario() -> (Scenario, Uuid) {
    let groups = InMemoryGroupRepository::new();
    let quests = InMemoryQuestRepository::new();
    let group_id = seed_group(&groups).await;
    let quest_id = seed_pyramid_quest(&quests, 30).await;
    let scenario = Scenario {
        groups,
        quests,
        statuses: InMemoryQuestStatusRepository::new(),
        publisher: RecordingPublisher::new(),
        group_id,
        quest_id,
    };

    let command = StartQuest {
        correlation_id: Uuid::new_v4(),
        group_id: scenario.group_id,
        quest_id: scenario.quest_id,
    };
    let status_id = handle_start_quest(
        &command,
        &fixed_clock(),
        &scenario.groups,
        &scenario.quests,
        &scenario.statuses,
        &scenario.publisher,
    )
    .await
    .unwrap()
    .status_id;

    (scenario, status_id)
}

/// Answers every question of the level at position `pos`.
async fn complete_level(scenario: &Scenario, status_id: Uuid, pos: usize) {
    let ids: Vec<Uuid> = scenario.statuses.get(status_id).unwrap().level_statuses()[pos]
        .questions()
        .iter()
        .map(|question| question.id)
        .collect();
    for question_status_id in ids {
        let command = RecordAnswer {
            correlation_id: Uuid::new_v4(),
            status_id,
            question_status_id,
        };
        handle_record_answer(&command, &fixed_clock(), &scenario.statuses, &scenario.publisher)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_handle_start_quest_materializes_pyramid_tree() {
    // Arrange & Act
    let (scenario, status_id) = started_scenario().await;

    // Assert
    let status = scenario.statuses.get(status_id).unwrap();
    let levels = status.level_statuses();
    assert_eq!(levels.len(), 3);

    // Indices [1, 2, 3] for the 3/2/1-sized levels respectively.
    let shapes: Vec<(u32, usize)> = levels
        .iter()
        .map(|level| (level.level_index(), level.questions().len()))
        .collect();
    assert_eq!(shapes, vec![(1, 3), (2, 2), (3, 1)]);

    // Only the 3 questions of the size-3 level start Unlocked.
    let unlocked: usize = levels
        .iter()
        .map(|level| {
            level
                .questions()
                .iter()
                .filter(|question| question.lock == LockState::Unlocked)
                .count()
        })
        .sum();
    assert_eq!(unlocked, 3);

    let published = scenario.publisher.published();
    assert_eq!(published[0].event_type, "quest_status.started");
}

#[tokio::test]
async fn test_handle_start_quest_rejects_duplicate() {
    // Arrange
    let (scenario, _) = started_scenario().await;

    let command = StartQuest {
        correlation_id: Uuid::new_v4(),
        group_id: scenario.group_id,
        quest_id: scenario.quest_id,
    };

    // Act
    let result = handle_start_quest(
        &command,
        &fixed_clock(),
        &scenario.groups,
        &scenario.quests,
        &scenario.statuses,
        &scenario.publisher,
    )
    .await;

    // Assert
    match result.unwrap_err() {
        DomainError::AlreadyStarted { group_id, quest_id } => {
            assert_eq!(group_id, scenario.group_id);
            assert_eq!(quest_id, scenario.quest_id);
        }
        other => panic!("expected AlreadyStarted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handle_start_quest_validates_group_and_quest() {
    // Arrange
    let groups = InMemoryGroupRepository::new();
    let quests = InMemoryQuestRepository::new();
    let statuses = InMemoryQuestStatusRepository::new();
    let publisher = RecordingPublisher::new();

    let command = StartQuest {
        correlation_id: Uuid::new_v4(),
        group_id: Uuid::new_v4(),
        quest_id: Uuid::new_v4(),
    };

    // Act: no group registered.
    let result = handle_start_quest(
        &command,
        &fixed_clock(),
        &groups,
        &quests,
        &statuses,
        &publisher,
    )
    .await;

    // Assert
    assert!(matches!(
        result.unwrap_err(),
        DomainError::GroupNotFound(_)
    ));

    // Act: group exists, quest does not.
    let group_id = seed_group(&groups).await;
    let command = StartQuest {
        correlation_id: Uuid::new_v4(),
        group_id,
        quest_id: Uuid::new_v4(),
    };
    let result = handle_start_quest(
        &command,
        &fixed_clock(),
        &groups,
        &quests,
        &statuses,
        &publisher,
    )
    .await;

    // Assert
    assert!(matches!(
        result.unwrap_err(),
        DomainError::QuestNotFound(_)
    ));
}

#[tokio::test]
async fn test_handle_record_answer_rejects_locked_question() {
    // Arrange
    let (scenario, status_id) = started_scenario().await;
    let locked_id = scenario.statuses.get(status_id).unwrap().level_statuses()[1]
        .questions()[0]
        .id;

    let command = RecordAnswer {
        correlation_id: Uuid::new_v4(),
        status_id,
        question_status_id: locked_id,
    };

    // Act
    let result = handle_record_answer(
        &command,
        &fixed_clock(),
        &scenario.statuses,
        &scenario.publisher,
    )
    .await;

    // Assert: rejected, and nothing was persisted.
    assert!(matches!(
        result.unwrap_err(),
        DomainError::QuestionLocked(_)
    ));
    let status = scenario.statuses.get(status_id).unwrap();
    assert_eq!(status.progress(), 0);
}

#[tokio::test]
async fn test_handle_record_answer_completing_level_unlocks_next() {
    // Arrange
    let (scenario, status_id) = started_scenario().await;

    // Act: answer all 3 questions of level-index 1.
    complete_level(&scenario, status_id, 0).await;

    // Assert: both questions of level-index 2 are unlocked, level 3
    // stays locked, and progress rose by exactly the level bonus.
    let status = scenario.statuses.get(status_id).unwrap();
    assert!(status.level_statuses()[0].completed());
    assert_eq!(status.level_statuses()[1].unlocked_questions().count(), 2);
    assert_eq!(status.level_statuses()[2].unlocked_questions().count(), 0);
    assert_eq!(status.progress(), 30);

    let published = scenario.publisher.published();
    let completed = published
        .iter()
        .find(|event| event.event_type == "quest_status.level_completed")
        .unwrap();
    assert_eq!(completed.payload["LevelCompleted"]["bonus"], 30);
}

#[tokio::test]
async fn test_handle_record_answer_finishing_quest_publishes_completion() {
    // Arrange
    let (scenario, status_id) = started_scenario().await;

    // Act
    for pos in 0..3 {
        complete_level(&scenario, status_id, pos).await;
    }

    // Assert
    let status = scenario.statuses.get(status_id).unwrap();
    assert!(status.completed());
    assert_eq!(status.progress(), status.total_points());
    assert_eq!(status.total_points(), 90);

    let published = scenario.publisher.published();
    assert_eq!(
        published.last().unwrap().event_type,
        "quest_status.completed"
    );
}

#[tokio::test]
async fn test_handle_record_answer_survives_failed_publish() {
    // Arrange
    let (scenario, status_id) = started_scenario().await;
    let question_status_id = scenario.statuses.get(status_id).unwrap().level_statuses()[0]
        .questions()[0]
        .id;

    let command = RecordAnswer {
        correlation_id: Uuid::new_v4(),
        status_id,
        question_status_id,
    };

    // Act: the publish sink is down.
    let result =
        handle_record_answer(&command, &fixed_clock(), &scenario.statuses, &FailingPublisher)
            .await;

    // Assert: publishing is fire-and-forget — the command succeeds and
    // the answer is persisted anyway.
    let answer = result.unwrap();
    assert_eq!(answer.events.len(), 1);
    assert_eq!(
        scenario.statuses.get(status_id).unwrap().progress(),
        10
    );
}

#[tokio::test]
async fn test_handle_record_answer_returns_error_for_unknown_status() {
    // Arrange
    let statuses = InMemoryQuestStatusRepository::new();
    let status_id = Uuid::new_v4();

    let command = RecordAnswer {
        correlation_id: Uuid::new_v4(),
        status_id,
        question_status_id: Uuid::new_v4(),
    };

    // Act
    let result = handle_record_answer(
        &command,
        &fixed_clock(),
        &statuses,
        &RecordingPublisher::new(),
    )
    .await;

    // Assert
    match result.unwrap_err() {
        DomainError::StatusNotFound(id) => assert_eq!(id, status_id),
        other => panic!("expected StatusNotFound, got {other:?}"),
    }
}

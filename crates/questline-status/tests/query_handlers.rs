use chrono::{TimeZone, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_group::domain::aggregates::Group;
use questline_group::domain::repository::GroupRepository;
use questline_quest::domain::aggregates::{Level, Quest};
use questline_quest::domain::repository::QuestRepository;
use uuid::Uuid;

use questline_status::application::command_handlers::{handle_record_answer, handle_start_quest};
use questline_status::application::query_handlers::{
    get_status_by_id, get_status_for_group, get_visible_questions,
};
use questline_status::domain::commands::{RecordAnswer, StartQuest};
use questline_test_support::{
    FixedClock, InMemoryGroupRepository, InMemoryQuestRepository,
    InMemoryQuestStatusRepository, RecordingPublisher,
};

fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

/// Group + [2, 1] quest with bonus 20 and 10, quest started.
async fn started_status(
    statuses: &InMemoryQuestStatusRepository,
) -> (Uuid, Uuid, Uuid) {
    let groups = InMemoryGroupRepository::new();
    let quests = InMemoryQuestRepository::new();

    let group = Group::create(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "rangers".to_owned(),
        "The Rangers".to_owned(),
        Uuid::new_v4(),
        &fixed_clock(),
    );
    let group_id = group.aggregate_id();
    groups.insert(&group).await.unwrap();

    let quest = Quest::create(
        Uuid::new_v4(),
        "trial".to_owned(),
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        vec![
            Level::new(20, vec![Uuid::new_v4(), Uuid::new_v4()]),
            Level::new(10, vec![Uuid::new_v4()]),
        ],
        Uuid::new_v4(),
        &fixed_clock(),
    )
    .unwrap();
    let quest_id = quest.aggregate_id();
    quests.insert(&quest).await.unwrap();

    let command = StartQuest {
        correlation_id: Uuid::new_v4(),
        group_id,
        quest_id,
    };
    let status_id = handle_start_quest(
        &command,
        &fixed_clock(),
        &groups,
        &quests,
        statuses,
        &RecordingPublisher::new(),
    )
    .await
    .unwrap()
    .status_id;

    (status_id, group_id, quest_id)
}

#[tokio::test]
async fn test_get_status_by_id_reports_derived_progress() {
    // Arrange
    let statuses = InMemoryQuestStatusRepository::new();
    let (status_id, _, _) = started_status(&statuses).await;

    // Act
    let view = get_status_by_id(status_id, &statuses).await.unwrap();

    // Assert
    assert_eq!(view.progress, 0);
    assert_eq!(view.total_points, 30);
    assert!(!view.completed);
    assert_eq!(view.levels.len(), 2);
    assert_eq!(view.levels[0].level_index, 1);
    assert_eq!(view.levels[0].points_per_question, 10);
    assert!(view.levels[0].questions.iter().all(|q| q.lock == "unlocked"));
    assert!(view.levels[1].questions.iter().all(|q| q.lock == "locked"));
}

#[tokio::test]
async fn test_get_status_for_group_distinguishes_started_from_not() {
    // Arrange
    let statuses = InMemoryQuestStatusRepository::new();
    let (_, group_id, quest_id) = started_status(&statuses).await;

    // Act & Assert
    let found = get_status_for_group(group_id, quest_id, &statuses)
        .await
        .unwrap();
    assert!(found.is_some());

    let missing = get_status_for_group(Uuid::new_v4(), quest_id, &statuses)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_get_visible_questions_grows_with_unlocks() {
    // Arrange
    let statuses = InMemoryQuestStatusRepository::new();
    let (status_id, _, _) = started_status(&statuses).await;

    let visible = get_visible_questions(status_id, &statuses).await.unwrap();
    assert_eq!(visible.len(), 2);
    assert_eq!(
        visible.iter().map(|q| q.index).collect::<Vec<_>>(),
        vec![1, 2]
    );

    // Act: answer both level-1 questions, unlocking level 2.
    for question in visible {
        let command = RecordAnswer {
            correlation_id: Uuid::new_v4(),
            status_id,
            question_status_id: question.question_status_id,
        };
        handle_record_answer(&command, &fixed_clock(), &statuses, &RecordingPublisher::new())
            .await
            .unwrap();
    }

    // Assert: all three questions are now visible, still in index order.
    let visible = get_visible_questions(status_id, &statuses).await.unwrap();
    assert_eq!(
        visible.iter().map(|q| q.index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(visible[2].lock, "unlocked");
}

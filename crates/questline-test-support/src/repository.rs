//! In-memory repositories backing handler tests.
//!
//! Each repository keeps plain state snapshots behind a mutex and rebuilds
//! aggregates through `from_state`, mirroring what the Postgres
//! implementations do with rows. `save` applies the same optimistic version
//! check, so concurrency-conflict paths are testable without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_core::error::DomainError;
use questline_group::domain::aggregates::{Group, MemberRemoval};
use questline_group::domain::repository::GroupRepository;
use questline_quest::domain::aggregates::{Level, Quest};
use questline_quest::domain::repository::QuestRepository;
use questline_status::domain::aggregates::{LevelStatus, QuestStatus};
use questline_status::domain::repository::QuestStatusRepository;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct GroupSnapshot {
    name: String,
    title: String,
    owner_id: Uuid,
    members: Vec<Uuid>,
    version: i64,
}

impl GroupSnapshot {
    fn of(group: &Group) -> Self {
        Self {
            name: group.name().to_owned(),
            title: group.title().to_owned(),
            owner_id: group.owner_id(),
            members: group.members().to_vec(),
            version: group.next_version(),
        }
    }

    fn rebuild(&self, id: Uuid) -> Group {
        Group::from_state(
            id,
            self.name.clone(),
            self.title.clone(),
            self.owner_id,
            self.members.clone(),
            self.version,
        )
    }
}

fn check_group_version(
    groups: &HashMap<Uuid, GroupSnapshot>,
    group: &Group,
) -> Result<(), DomainError> {
    let stored = groups
        .get(&group.aggregate_id())
        .ok_or(DomainError::GroupNotFound(group.aggregate_id()))?;
    if stored.version != group.version() {
        return Err(DomainError::ConcurrencyConflict {
            aggregate_id: group.aggregate_id(),
            expected: group.version(),
            actual: stored.version,
        });
    }
    Ok(())
}

/// In-memory `GroupRepository` for handler tests.
#[derive(Debug, Default)]
pub struct InMemoryGroupRepository {
    groups: Mutex<HashMap<Uuid, GroupSnapshot>>,
}

impl InMemoryGroupRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous lookup for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, group_id: Uuid) -> Option<Group> {
        self.groups
            .lock()
            .unwrap()
            .get(&group_id)
            .map(|snapshot| snapshot.rebuild(group_id))
    }

    /// Synchronous membership lookup for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn group_of(&self, player_id: Uuid) -> Option<Group> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|(_, snapshot)| snapshot.members.contains(&player_id))
            .map(|(id, snapshot)| snapshot.rebuild(*id))
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_id(&self, group_id: Uuid) -> Result<Option<Group>, DomainError> {
        Ok(self.get(group_id))
    }

    async fn find_by_member(&self, player_id: Uuid) -> Result<Option<Group>, DomainError> {
        Ok(self.group_of(player_id))
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Group>, DomainError> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .find(|(_, snapshot)| snapshot.owner_id == owner_id && snapshot.name == name)
            .map(|(id, snapshot)| snapshot.rebuild(*id)))
    }

    async fn insert(&self, group: &Group) -> Result<(), DomainError> {
        self.groups
            .lock()
            .unwrap()
            .insert(group.aggregate_id(), GroupSnapshot::of(group));
        Ok(())
    }

    async fn save(&self, group: &Group) -> Result<(), DomainError> {
        let mut groups = self.groups.lock().unwrap();
        check_group_version(&groups, group)?;
        groups.insert(group.aggregate_id(), GroupSnapshot::of(group));
        Ok(())
    }

    async fn save_move(
        &self,
        source: &Group,
        removal: MemberRemoval,
        target: &Group,
    ) -> Result<(), DomainError> {
        // Both version checks run before either write, inside one lock
        // section, so a conflict leaves the map untouched.
        let mut groups = self.groups.lock().unwrap();
        check_group_version(&groups, source)?;
        check_group_version(&groups, target)?;
        match removal {
            MemberRemoval::Removed => {
                groups.insert(source.aggregate_id(), GroupSnapshot::of(source));
            }
            MemberRemoval::Disbanded => {
                groups.remove(&source.aggregate_id());
            }
        }
        groups.insert(target.aggregate_id(), GroupSnapshot::of(target));
        Ok(())
    }

    async fn delete(&self, group_id: Uuid) -> Result<(), DomainError> {
        self.groups.lock().unwrap().remove(&group_id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct QuestSnapshot {
    title: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    levels: Vec<Level>,
    version: i64,
}

impl QuestSnapshot {
    fn of(quest: &Quest) -> Self {
        Self {
            title: quest.title().to_owned(),
            start_time: quest.start_time(),
            end_time: quest.end_time(),
            levels: quest.levels().to_vec(),
            version: quest.next_version(),
        }
    }

    fn rebuild(&self, id: Uuid) -> Quest {
        Quest::from_state(
            id,
            self.title.clone(),
            self.start_time,
            self.end_time,
            self.levels.clone(),
            self.version,
        )
    }
}

/// In-memory `QuestRepository` for handler tests.
#[derive(Debug, Default)]
pub struct InMemoryQuestRepository {
    quests: Mutex<HashMap<Uuid, QuestSnapshot>>,
}

impl InMemoryQuestRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous lookup for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, quest_id: Uuid) -> Option<Quest> {
        self.quests
            .lock()
            .unwrap()
            .get(&quest_id)
            .map(|snapshot| snapshot.rebuild(quest_id))
    }
}

#[async_trait]
impl QuestRepository for InMemoryQuestRepository {
    async fn find_by_id(&self, quest_id: Uuid) -> Result<Option<Quest>, DomainError> {
        Ok(self.get(quest_id))
    }

    async fn find_active(&self, at: DateTime<Utc>) -> Result<Option<Quest>, DomainError> {
        // Most recently started wins; id breaks exact start-time ties so the
        // result stays deterministic.
        Ok(self
            .quests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, snapshot)| snapshot.start_time <= at && at <= snapshot.end_time)
            .max_by_key(|(id, snapshot)| (snapshot.start_time, **id))
            .map(|(id, snapshot)| snapshot.rebuild(*id)))
    }

    async fn insert(&self, quest: &Quest) -> Result<(), DomainError> {
        self.quests
            .lock()
            .unwrap()
            .insert(quest.aggregate_id(), QuestSnapshot::of(quest));
        Ok(())
    }

    async fn save(&self, quest: &Quest) -> Result<(), DomainError> {
        let mut quests = self.quests.lock().unwrap();
        let stored = quests
            .get(&quest.aggregate_id())
            .ok_or(DomainError::QuestNotFound(quest.aggregate_id()))?;
        if stored.version != quest.version() {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: quest.aggregate_id(),
                expected: quest.version(),
                actual: stored.version,
            });
        }
        quests.insert(quest.aggregate_id(), QuestSnapshot::of(quest));
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StatusSnapshot {
    group_id: Uuid,
    quest_id: Uuid,
    levels: Vec<LevelStatus>,
    version: i64,
}

impl StatusSnapshot {
    fn of(status: &QuestStatus) -> Self {
        Self {
            group_id: status.group_id(),
            quest_id: status.quest_id(),
            levels: status.level_statuses().to_vec(),
            version: status.next_version(),
        }
    }

    fn rebuild(&self, id: Uuid) -> QuestStatus {
        QuestStatus::from_state(
            id,
            self.group_id,
            self.quest_id,
            self.levels.clone(),
            self.version,
        )
    }
}

/// In-memory `QuestStatusRepository` for handler tests.
///
/// `insert` enforces the (group, quest) uniqueness constraint the same way
/// the Postgres implementation does through its unique index.
#[derive(Debug, Default)]
pub struct InMemoryQuestStatusRepository {
    statuses: Mutex<HashMap<Uuid, StatusSnapshot>>,
}

impl InMemoryQuestStatusRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous lookup for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, status_id: Uuid) -> Option<QuestStatus> {
        self.statuses
            .lock()
            .unwrap()
            .get(&status_id)
            .map(|snapshot| snapshot.rebuild(status_id))
    }
}

#[async_trait]
impl QuestStatusRepository for InMemoryQuestStatusRepository {
    async fn find_by_id(&self, status_id: Uuid) -> Result<Option<QuestStatus>, DomainError> {
        Ok(self.get(status_id))
    }

    async fn find_by_group_and_quest(
        &self,
        group_id: Uuid,
        quest_id: Uuid,
    ) -> Result<Option<QuestStatus>, DomainError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .iter()
            .find(|(_, snapshot)| snapshot.group_id == group_id && snapshot.quest_id == quest_id)
            .map(|(id, snapshot)| snapshot.rebuild(*id)))
    }

    async fn insert(&self, status: &QuestStatus) -> Result<(), DomainError> {
        let mut statuses = self.statuses.lock().unwrap();
        let duplicate = statuses.values().any(|snapshot| {
            snapshot.group_id == status.group_id() && snapshot.quest_id == status.quest_id()
        });
        if duplicate {
            return Err(DomainError::AlreadyStarted {
                group_id: status.group_id(),
                quest_id: status.quest_id(),
            });
        }
        statuses.insert(status.aggregate_id(), StatusSnapshot::of(status));
        Ok(())
    }

    async fn save(&self, status: &QuestStatus) -> Result<(), DomainError> {
        let mut statuses = self.statuses.lock().unwrap();
        let stored = statuses
            .get(&status.aggregate_id())
            .ok_or(DomainError::StatusNotFound(status.aggregate_id()))?;
        if stored.version != status.version() {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: status.aggregate_id(),
                expected: status.version(),
                actual: stored.version,
            });
        }
        statuses.insert(status.aggregate_id(), StatusSnapshot::of(status));
        Ok(())
    }
}

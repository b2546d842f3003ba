//! Aggregate roots for the Quest Definition Store context.

use chrono::{DateTime, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    LevelAdded, QuestCreated, QuestEvent, QuestEventKind, QuestionAdded, QuestionRemoved,
};

/// One stage of a quest: a bonus value and a fixed set of question
/// references.
///
/// The index is derived from the pyramid rule
/// `index = total_levels - question_count + 1`: levels with more questions
/// sort earlier. It is recomputed by the owning quest whenever the level set
/// or a question set changes.
#[derive(Debug, Clone)]
pub struct Level {
    id: Uuid,
    bonus: u32,
    question_ids: Vec<Uuid>,
    index: u32,
}

impl Level {
    /// Creates a level that is not yet attached to a quest. The index is
    /// assigned when the quest reindexes its levels.
    #[must_use]
    pub fn new(bonus: u32, question_ids: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bonus,
            question_ids,
            index: 0,
        }
    }

    /// Rehydrates a level from persisted state.
    #[must_use]
    pub fn from_state(id: Uuid, bonus: u32, question_ids: Vec<Uuid>, index: u32) -> Self {
        Self {
            id,
            bonus,
            question_ids,
            index,
        }
    }

    /// Returns the level identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the bonus point value.
    #[must_use]
    pub fn bonus(&self) -> u32 {
        self.bonus
    }

    /// Returns the question references.
    #[must_use]
    pub fn question_ids(&self) -> &[Uuid] {
        &self.question_ids
    }

    /// Returns the number of questions.
    #[must_use]
    pub fn question_count(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.question_ids.len() as u32;
        count
    }

    /// Returns the pyramid index within the owning quest.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Points credited per answered question. Exact by construction: the
    /// quest validates that the bonus is divisible by the question count.
    #[must_use]
    pub fn points_per_question(&self) -> u32 {
        self.bonus / self.question_count()
    }
}

/// The aggregate root for a quest definition: a titled time window over an
/// ordered set of levels.
#[derive(Debug)]
pub struct Quest {
    id: Uuid,
    title: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    levels: Vec<Level>,
    version: i64,
    uncommitted_events: Vec<QuestEvent>,
}

impl Quest {
    /// Creates a quest with a fixed set of levels and assigns pyramid
    /// indices. The full level set must satisfy the pyramid invariants;
    /// later question edits may pass through looser intermediate states,
    /// which are re-checked when a group starts the quest.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the end time does not follow
    /// the start time, a level has no questions, a bonus is not divisible
    /// by its question count, or two levels share a question count (which
    /// would break index uniqueness).
    pub fn create(
        id: Uuid,
        title: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        levels: Vec<Level>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        if end_time <= start_time {
            return Err(DomainError::Validation(
                "quest end time must follow its start time".into(),
            ));
        }
        let mut quest = Self {
            id,
            title: title.clone(),
            start_time,
            end_time,
            levels,
            version: 0,
            uncommitted_events: Vec::new(),
        };
        quest.reindex_levels()?;
        quest.validate_pyramid()?;
        let level_ids = quest.levels.iter().map(Level::id).collect();
        quest.record(
            QuestEventKind::QuestCreated(QuestCreated {
                quest_id: id,
                title,
                level_ids,
            }),
            correlation_id,
            clock,
        );
        Ok(quest)
    }

    /// Rehydrates a quest from persisted state. Levels must already carry
    /// their indices.
    #[must_use]
    pub fn from_state(
        id: Uuid,
        title: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        levels: Vec<Level>,
        version: i64,
    ) -> Self {
        Self {
            id,
            title,
            start_time,
            end_time,
            levels,
            version,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the quest title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the start of the availability window.
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns the end of the availability window.
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Returns the levels in index order.
    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Returns true when the availability window contains the given moment.
    #[must_use]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at <= self.end_time
    }

    /// Attaches a new level and reindexes all siblings.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the resulting level set
    /// violates the pyramid invariants.
    pub fn add_level(
        &mut self,
        level: Level,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let level_id = level.id;
        self.levels.push(level);
        self.reindex_levels()?;
        self.record(
            QuestEventKind::LevelAdded(LevelAdded {
                quest_id: self.id,
                level_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Adds a question reference to a level and reindexes the quest's
    /// levels. A question already present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the level is not part of this
    /// quest or the resulting level set violates the pyramid invariants.
    pub fn add_question(
        &mut self,
        level_id: Uuid,
        question_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let level = self.level_mut(level_id)?;
        if level.question_ids.contains(&question_id) {
            return Ok(());
        }
        level.question_ids.push(question_id);
        self.reindex_levels()?;
        self.record(
            QuestEventKind::QuestionAdded(QuestionAdded {
                quest_id: self.id,
                level_id,
                question_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Removes a question reference from a level and reindexes the quest's
    /// levels.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the level is not part of this
    /// quest, the question is not in the level, or the resulting level set
    /// violates the pyramid invariants.
    pub fn remove_question(
        &mut self,
        level_id: Uuid,
        question_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let level = self.level_mut(level_id)?;
        if !level.question_ids.contains(&question_id) {
            return Err(DomainError::Validation(format!(
                "question {question_id} is not in level {level_id}"
            )));
        }
        level.question_ids.retain(|id| *id != question_id);
        self.reindex_levels()?;
        self.record(
            QuestEventKind::QuestionRemoved(QuestionRemoved {
                quest_id: self.id,
                level_id,
                question_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    fn level_mut(&mut self, level_id: Uuid) -> Result<&mut Level, DomainError> {
        let quest_id = self.id;
        self.levels
            .iter_mut()
            .find(|level| level.id == level_id)
            .ok_or_else(|| {
                DomainError::Validation(format!("level {level_id} is not part of quest {quest_id}"))
            })
    }

    /// Checks the strict pyramid invariants: indices form the permutation
    /// {1..N} (equivalently, question counts are distinct and at most N)
    /// and every bonus divides evenly over its questions. Holds at quest
    /// creation and must hold again before any group starts the quest;
    /// intermediate editing states are exempt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` describing the violated invariant.
    pub fn validate_pyramid(&self) -> Result<(), DomainError> {
        #[allow(clippy::cast_possible_truncation)]
        let total = self.levels.len() as u32;

        for level in &self.levels {
            let count = level.question_count();
            if count > total {
                return Err(DomainError::Validation(format!(
                    "level {} holds {count} questions but the quest has only {total} levels",
                    level.id
                )));
            }
            if level.bonus % count != 0 {
                return Err(DomainError::Validation(format!(
                    "level {} bonus {} is not divisible by its question count {count}",
                    level.id, level.bonus
                )));
            }
        }

        let mut indices: Vec<u32> = self.levels.iter().map(|level| level.index).collect();
        indices.sort_unstable();
        indices.dedup();
        if indices.len() != self.levels.len() {
            return Err(DomainError::Validation(
                "level question counts must be distinct to keep indices unique".into(),
            ));
        }
        Ok(())
    }

    /// Recomputes all level indices from the pyramid rule and re-sorts the
    /// level set into index order. Oversized levels clamp to index 1; the
    /// strict invariants are re-checked by `validate_pyramid` at the
    /// creation and start gates.
    fn reindex_levels(&mut self) -> Result<(), DomainError> {
        #[allow(clippy::cast_possible_truncation)]
        let total = self.levels.len() as u32;

        for level in &mut self.levels {
            let count = level.question_count();
            if count == 0 {
                return Err(DomainError::Validation(format!(
                    "level {} must hold at least one question",
                    level.id
                )));
            }
            level.index = total.saturating_sub(count) + 1;
        }

        self.levels.sort_by_key(Level::index);
        Ok(())
    }

    fn record(&mut self, kind: QuestEventKind, correlation_id: Uuid, clock: &dyn Clock) {
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
        self.uncommitted_events.push(QuestEvent { metadata, kind });
    }
}

impl AggregateRoot for Quest {
    type Event = QuestEvent;

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

    use super::{Level, Quest};

    struct TestClock;

    impl Clock for TestClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        }
    }

    fn questions(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    /// Levels sized n, n-1, ..., 1 — the canonical pyramid.
    fn pyramid_levels(n: usize, bonus_per_level: u32) -> Vec<Level> {
        (0..n)
            .map(|i| Level::new(bonus_per_level, questions(n - i)))
            .collect()
    }

    fn make_quest(levels: Vec<Level>) -> Result<Quest, questline_core::error::DomainError> {
        Quest::create(
            Uuid::new_v4(),
            "trial of the five gates".to_owned(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            levels,
            Uuid::new_v4(),
            &TestClock,
        )
    }

    #[test]
    fn test_pyramid_indices_are_unique_permutation() {
        let quest = make_quest(pyramid_levels(5, 0)).unwrap();

        let total = quest.levels().len() as u32;
        let mut seen = Vec::new();
        for level in quest.levels() {
            assert_eq!(level.index(), total - level.question_count() + 1);
            assert!(!seen.contains(&level.index()));
            seen.push(level.index());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=total).collect::<Vec<_>>());
    }

    #[test]
    fn test_levels_sorted_by_index_after_creation() {
        // Built out of order: sizes 1, 3, 2.
        let levels = vec![
            Level::new(10, questions(1)),
            Level::new(30, questions(3)),
            Level::new(20, questions(2)),
        ];
        let quest = make_quest(levels).unwrap();

        let indices: Vec<u32> = quest.levels().iter().map(Level::index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        // The size-3 level comes first.
        assert_eq!(quest.levels()[0].question_count(), 3);
    }

    #[test]
    fn test_end_time_before_start_time_is_rejected() {
        let result = Quest::create(
            Uuid::new_v4(),
            "backwards".to_owned(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            pyramid_levels(2, 10),
            Uuid::new_v4(),
            &TestClock,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_level_sizes_are_rejected() {
        let levels = vec![Level::new(10, questions(2)), Level::new(10, questions(2))];

        assert!(make_quest(levels).is_err());
    }

    #[test]
    fn test_indivisible_bonus_is_rejected() {
        let levels = vec![Level::new(25, questions(2)), Level::new(10, questions(1))];

        assert!(make_quest(levels).is_err());
    }

    #[test]
    fn test_question_edits_reach_a_new_pyramid_shape() {
        // Start with a [2, 1] pyramid and grow it into [3, 2, 1].
        let level_a = Level::new(20, questions(2));
        let level_b = Level::new(10, questions(1));
        let level_a_id = level_a.id();
        let level_b_id = level_b.id();
        let mut quest = make_quest(vec![level_a, level_b]).unwrap();

        quest
            .add_question(level_a_id, Uuid::new_v4(), Uuid::new_v4(), &TestClock)
            .unwrap();
        quest
            .add_question(level_b_id, Uuid::new_v4(), Uuid::new_v4(), &TestClock)
            .unwrap();
        quest
            .add_level(Level::new(10, questions(1)), Uuid::new_v4(), &TestClock)
            .unwrap();

        // The intermediate states were not pyramids; the final shape is.
        quest.validate_pyramid().unwrap();
        let indices: Vec<u32> = quest.levels().iter().map(Level::index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_question_requires_question_in_level() {
        let level = Level::new(20, questions(2));
        let level_id = level.id();
        let mut quest = make_quest(vec![level, Level::new(10, questions(1))]).unwrap();

        let result = quest.remove_question(level_id, Uuid::new_v4(), Uuid::new_v4(), &TestClock);

        assert!(result.is_err());
    }

    #[test]
    fn test_remove_last_question_of_a_level_is_rejected() {
        let small = Level::new(10, questions(1));
        let small_id = small.id();
        let only_question = small.question_ids()[0];
        let mut quest = make_quest(vec![Level::new(20, questions(2)), small]).unwrap();

        let result = quest.remove_question(small_id, only_question, Uuid::new_v4(), &TestClock);

        assert!(result.is_err());
    }

    #[test]
    fn test_points_per_question_is_exact() {
        let quest = make_quest(vec![
            Level::new(30, questions(3)),
            Level::new(30, questions(2)),
            Level::new(30, questions(1)),
        ])
        .unwrap();

        let points: Vec<u32> = quest
            .levels()
            .iter()
            .map(Level::points_per_question)
            .collect();
        assert_eq!(points, vec![10, 15, 30]);
    }

    #[test]
    fn test_is_active_at_window_boundaries() {
        let quest = make_quest(pyramid_levels(1, 10)).unwrap();

        assert!(quest.is_active_at(quest.start_time()));
        assert!(quest.is_active_at(quest.end_time()));
        assert!(!quest.is_active_at(quest.end_time() + chrono::Duration::seconds(1)));
    }
}

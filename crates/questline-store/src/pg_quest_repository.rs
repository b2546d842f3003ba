//! `PostgreSQL` implementation of the `QuestRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_core::error::DomainError;
use questline_quest::domain::aggregates::{Level, Quest};
use questline_quest::domain::repository::QuestRepository;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{column_u32, infra};

/// PostgreSQL-backed quest repository.
#[derive(Debug, Clone)]
pub struct PgQuestRepository {
    pool: PgPool,
}

impl PgQuestRepository {
    /// Creates a new `PgQuestRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_levels(&self, quest_id: Uuid) -> Result<Vec<Level>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, bonus, level_index FROM quest_levels
             WHERE quest_id = $1 ORDER BY level_index",
        )
        .bind(quest_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        let mut levels = Vec::with_capacity(rows.len());
        for row in rows {
            let level_id: Uuid = row.get("id");
            let question_ids: Vec<Uuid> = sqlx::query(
                "SELECT question_id FROM level_questions WHERE level_id = $1 ORDER BY position",
            )
            .bind(level_id)
            .fetch_all(&self.pool)
            .await
            .map_err(infra)?
            .iter()
            .map(|question| question.get("question_id"))
            .collect();

            levels.push(Level::from_state(
                level_id,
                column_u32(row.get("bonus"), "bonus")?,
                question_ids,
                column_u32(row.get("level_index"), "level_index")?,
            ));
        }
        Ok(levels)
    }

    async fn load(&self, quest_id: Uuid) -> Result<Option<Quest>, DomainError> {
        let row = sqlx::query(
            "SELECT title, start_time, end_time, version FROM quests WHERE id = $1",
        )
        .bind(quest_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let levels = self.load_levels(quest_id).await?;
        Ok(Some(Quest::from_state(
            quest_id,
            row.get("title"),
            row.get("start_time"),
            row.get("end_time"),
            levels,
            row.get("version"),
        )))
    }

    async fn write_levels(
        tx: &mut Transaction<'_, Postgres>,
        quest: &Quest,
    ) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM quest_levels WHERE quest_id = $1")
            .bind(quest.aggregate_id())
            .execute(&mut **tx)
            .await
            .map_err(infra)?;

        for level in quest.levels() {
            sqlx::query(
                "INSERT INTO quest_levels (id, quest_id, bonus, level_index)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(level.id())
            .bind(quest.aggregate_id())
            .bind(i64::from(level.bonus()))
            .bind(i64::from(level.index()))
            .execute(&mut **tx)
            .await
            .map_err(infra)?;

            for (position, question_id) in level.question_ids().iter().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let position = position as i64;
                sqlx::query(
                    "INSERT INTO level_questions (level_id, question_id, position)
                     VALUES ($1, $2, $3)",
                )
                .bind(level.id())
                .bind(question_id)
                .bind(position)
                .execute(&mut **tx)
                .await
                .map_err(infra)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl QuestRepository for PgQuestRepository {
    async fn find_by_id(&self, quest_id: Uuid) -> Result<Option<Quest>, DomainError> {
        self.load(quest_id).await
    }

    async fn find_active(&self, at: DateTime<Utc>) -> Result<Option<Quest>, DomainError> {
        // Most recently started wins when windows overlap; id breaks exact
        // start-time ties deterministically.
        let row = sqlx::query(
            "SELECT id FROM quests WHERE start_time <= $1 AND $1 <= end_time
             ORDER BY start_time DESC, id DESC LIMIT 1",
        )
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;
        match row {
            Some(row) => self.load(row.get("id")).await,
            None => Ok(None),
        }
    }

    async fn insert(&self, quest: &Quest) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        sqlx::query(
            "INSERT INTO quests (id, title, start_time, end_time, version)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(quest.aggregate_id())
        .bind(quest.title())
        .bind(quest.start_time())
        .bind(quest.end_time())
        .bind(quest.next_version())
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        Self::write_levels(&mut tx, quest).await?;
        tx.commit().await.map_err(infra)
    }

    async fn save(&self, quest: &Quest) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let updated = sqlx::query(
            "UPDATE quests SET title = $1, start_time = $2, end_time = $3, version = $4
             WHERE id = $5 AND version = $6",
        )
        .bind(quest.title())
        .bind(quest.start_time())
        .bind(quest.end_time())
        .bind(quest.next_version())
        .bind(quest.aggregate_id())
        .bind(quest.version())
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        if updated.rows_affected() == 0 {
            let actual = sqlx::query("SELECT version FROM quests WHERE id = $1")
                .bind(quest.aggregate_id())
                .fetch_optional(&mut *tx)
                .await
                .map_err(infra)?;
            return Err(match actual {
                Some(row) => DomainError::ConcurrencyConflict {
                    aggregate_id: quest.aggregate_id(),
                    expected: quest.version(),
                    actual: row.get("version"),
                },
                None => DomainError::QuestNotFound(quest.aggregate_id()),
            });
        }

        Self::write_levels(&mut tx, quest).await?;
        tx.commit().await.map_err(infra)
    }
}

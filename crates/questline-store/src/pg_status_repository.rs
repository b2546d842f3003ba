//! `PostgreSQL` implementation of the `QuestStatusRepository` trait.

use std::str::FromStr;

use async_trait::async_trait;
use questline_core::aggregate::AggregateRoot;
use questline_core::error::DomainError;
use questline_status::domain::aggregates::{LevelStatus, LockState, QuestStatus, QuestionStatus};
use questline_status::domain::repository::QuestStatusRepository;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{column_u32, infra, is_unique_violation};

/// PostgreSQL-backed quest status repository.
#[derive(Debug, Clone)]
pub struct PgStatusRepository {
    pool: PgPool,
}

impl PgStatusRepository {
    /// Creates a new `PgStatusRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_levels(&self, status_id: Uuid) -> Result<Vec<LevelStatus>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, level_id, level_index, bonus, points_per_question
             FROM level_statuses WHERE status_id = $1 ORDER BY level_index",
        )
        .bind(status_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        let mut levels = Vec::with_capacity(rows.len());
        for row in rows {
            let level_status_id: Uuid = row.get("id");
            let question_rows = sqlx::query(
                "SELECT id, question_id, question_index, lock_state
                 FROM question_statuses WHERE level_status_id = $1 ORDER BY question_index",
            )
            .bind(level_status_id)
            .fetch_all(&self.pool)
            .await
            .map_err(infra)?;

            let mut questions = Vec::with_capacity(question_rows.len());
            for question in question_rows {
                questions.push(QuestionStatus {
                    id: question.get("id"),
                    question_id: question.get("question_id"),
                    index: column_u32(question.get("question_index"), "question_index")?,
                    lock: LockState::from_str(question.get::<&str, _>("lock_state"))?,
                });
            }

            levels.push(LevelStatus::from_state(
                level_status_id,
                row.get("level_id"),
                column_u32(row.get("level_index"), "level_index")?,
                column_u32(row.get("bonus"), "bonus")?,
                column_u32(row.get("points_per_question"), "points_per_question")?,
                questions,
            ));
        }
        Ok(levels)
    }

    async fn load(&self, status_id: Uuid) -> Result<Option<QuestStatus>, DomainError> {
        let row = sqlx::query(
            "SELECT group_id, quest_id, version FROM quest_statuses WHERE id = $1",
        )
        .bind(status_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let levels = self.load_levels(status_id).await?;
        Ok(Some(QuestStatus::from_state(
            status_id,
            row.get("group_id"),
            row.get("quest_id"),
            levels,
            row.get("version"),
        )))
    }

    async fn write_tree(
        tx: &mut Transaction<'_, Postgres>,
        status: &QuestStatus,
    ) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM level_statuses WHERE status_id = $1")
            .bind(status.aggregate_id())
            .execute(&mut **tx)
            .await
            .map_err(infra)?;

        for level in status.level_statuses() {
            sqlx::query(
                "INSERT INTO level_statuses
                     (id, status_id, level_id, level_index, bonus, points_per_question)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(level.id())
            .bind(status.aggregate_id())
            .bind(level.level_id())
            .bind(i64::from(level.level_index()))
            .bind(i64::from(level.bonus()))
            .bind(i64::from(level.points_per_question()))
            .execute(&mut **tx)
            .await
            .map_err(infra)?;

            for question in level.questions() {
                sqlx::query(
                    "INSERT INTO question_statuses
                         (id, level_status_id, question_id, question_index, lock_state)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(question.id)
                .bind(level.id())
                .bind(question.question_id)
                .bind(i64::from(question.index))
                .bind(question.lock.as_str())
                .execute(&mut **tx)
                .await
                .map_err(infra)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl QuestStatusRepository for PgStatusRepository {
    async fn find_by_id(&self, status_id: Uuid) -> Result<Option<QuestStatus>, DomainError> {
        self.load(status_id).await
    }

    async fn find_by_group_and_quest(
        &self,
        group_id: Uuid,
        quest_id: Uuid,
    ) -> Result<Option<QuestStatus>, DomainError> {
        let row = sqlx::query(
            "SELECT id FROM quest_statuses WHERE group_id = $1 AND quest_id = $2",
        )
        .bind(group_id)
        .bind(quest_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;
        match row {
            Some(row) => self.load(row.get("id")).await,
            None => Ok(None),
        }
    }

    async fn insert(&self, status: &QuestStatus) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        sqlx::query(
            "INSERT INTO quest_statuses (id, group_id, quest_id, version)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(status.aggregate_id())
        .bind(status.group_id())
        .bind(status.quest_id())
        .bind(status.next_version())
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DomainError::AlreadyStarted {
                    group_id: status.group_id(),
                    quest_id: status.quest_id(),
                }
            } else {
                infra(err)
            }
        })?;

        Self::write_tree(&mut tx, status).await?;
        tx.commit().await.map_err(infra)
    }

    async fn save(&self, status: &QuestStatus) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let updated = sqlx::query(
            "UPDATE quest_statuses SET version = $1 WHERE id = $2 AND version = $3",
        )
        .bind(status.next_version())
        .bind(status.aggregate_id())
        .bind(status.version())
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        if updated.rows_affected() == 0 {
            let actual = sqlx::query("SELECT version FROM quest_statuses WHERE id = $1")
                .bind(status.aggregate_id())
                .fetch_optional(&mut *tx)
                .await
                .map_err(infra)?;
            return Err(match actual {
                Some(row) => DomainError::ConcurrencyConflict {
                    aggregate_id: status.aggregate_id(),
                    expected: status.version(),
                    actual: row.get("version"),
                },
                None => DomainError::StatusNotFound(status.aggregate_id()),
            });
        }

        Self::write_tree(&mut tx, status).await?;
        tx.commit().await.map_err(infra)
    }
}

//! `PostgreSQL` implementation of the `GroupRepository` trait.

use async_trait::async_trait;
use questline_core::aggregate::AggregateRoot;
use questline_core::error::DomainError;
use questline_group::domain::aggregates::{Group, MemberRemoval};
use questline_group::domain::repository::GroupRepository;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{infra, is_unique_violation};

/// PostgreSQL-backed group repository.
#[derive(Debug, Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    /// Creates a new `PgGroupRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load(&self, group_id: Uuid) -> Result<Option<Group>, DomainError> {
        let row = sqlx::query("SELECT name, title, owner_id, version FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let members: Vec<Uuid> = sqlx::query(
            "SELECT player_id FROM group_members WHERE group_id = $1 ORDER BY position",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?
        .iter()
        .map(|member| member.get("player_id"))
        .collect();

        Ok(Some(Group::from_state(
            group_id,
            row.get("name"),
            row.get("title"),
            row.get("owner_id"),
            members,
            row.get("version"),
        )))
    }

    /// Applies the CAS row update plus a member rewrite inside the caller's
    /// transaction, so multi-group writes commit or roll back as one.
    async fn save_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        group: &Group,
    ) -> Result<(), DomainError> {
        let updated = sqlx::query(
            "UPDATE groups SET name = $1, title = $2, owner_id = $3, version = $4
             WHERE id = $5 AND version = $6",
        )
        .bind(group.name())
        .bind(group.title())
        .bind(group.owner_id())
        .bind(group.next_version())
        .bind(group.aggregate_id())
        .bind(group.version())
        .execute(&mut **tx)
        .await
        .map_err(infra)?;

        if updated.rows_affected() == 0 {
            let actual = sqlx::query("SELECT version FROM groups WHERE id = $1")
                .bind(group.aggregate_id())
                .fetch_optional(&mut **tx)
                .await
                .map_err(infra)?;
            return Err(match actual {
                Some(row) => DomainError::ConcurrencyConflict {
                    aggregate_id: group.aggregate_id(),
                    expected: group.version(),
                    actual: row.get("version"),
                },
                None => DomainError::GroupNotFound(group.aggregate_id()),
            });
        }

        Self::write_members(tx, group).await
    }

    async fn write_members(
        tx: &mut Transaction<'_, Postgres>,
        group: &Group,
    ) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM group_members WHERE group_id = $1")
            .bind(group.aggregate_id())
            .execute(&mut **tx)
            .await
            .map_err(infra)?;

        for (position, player_id) in group.members().iter().enumerate() {
            #[allow(clippy::cast_possible_wrap)]
            let position = position as i64;
            sqlx::query(
                "INSERT INTO group_members (group_id, player_id, position) VALUES ($1, $2, $3)",
            )
            .bind(group.aggregate_id())
            .bind(player_id)
            .bind(position)
            .execute(&mut **tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    DomainError::Validation(format!(
                        "player {player_id} already belongs to a group"
                    ))
                } else {
                    infra(err)
                }
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn find_by_id(&self, group_id: Uuid) -> Result<Option<Group>, DomainError> {
        self.load(group_id).await
    }

    async fn find_by_member(&self, player_id: Uuid) -> Result<Option<Group>, DomainError> {
        let row = sqlx::query("SELECT group_id FROM group_members WHERE player_id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        match row {
            Some(row) => self.load(row.get("group_id")).await,
            None => Ok(None),
        }
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Group>, DomainError> {
        let row = sqlx::query("SELECT id FROM groups WHERE owner_id = $1 AND name = $2")
            .bind(owner_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        match row {
            Some(row) => self.load(row.get("id")).await,
            None => Ok(None),
        }
    }

    async fn insert(&self, group: &Group) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        sqlx::query(
            "INSERT INTO groups (id, name, title, owner_id, version) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(group.aggregate_id())
        .bind(group.name())
        .bind(group.title())
        .bind(group.owner_id())
        .bind(group.next_version())
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DomainError::InvalidOwner(format!(
                    "owner {} already has a group named {}",
                    group.owner_id(),
                    group.name()
                ))
            } else {
                infra(err)
            }
        })?;

        Self::write_members(&mut tx, group).await?;
        tx.commit().await.map_err(infra)
    }

    async fn save(&self, group: &Group) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;
        Self::save_in_tx(&mut tx, group).await?;
        tx.commit().await.map_err(infra)
    }

    async fn save_move(
        &self,
        source: &Group,
        removal: MemberRemoval,
        target: &Group,
    ) -> Result<(), DomainError> {
        // One transaction spans both groups: a failure on either side rolls
        // the whole move back, so no observer sees a detached player who
        // never arrived in the target group.
        let mut tx = self.pool.begin().await.map_err(infra)?;
        match removal {
            MemberRemoval::Removed => Self::save_in_tx(&mut tx, source).await?,
            MemberRemoval::Disbanded => {
                sqlx::query("DELETE FROM groups WHERE id = $1")
                    .bind(source.aggregate_id())
                    .execute(&mut *tx)
                    .await
                    .map_err(infra)?;
            }
        }
        Self::save_in_tx(&mut tx, target).await?;
        tx.commit().await.map_err(infra)
    }

    async fn delete(&self, group_id: Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(infra)?;
        Ok(())
    }
}

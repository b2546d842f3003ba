//! Questline database schema.

use questline_core::error::DomainError;
use sqlx::PgPool;

use crate::infra;

/// SQL to create the group registry tables.
///
/// The unique index on `group_members.player_id` backs the single-group
/// invariant at the storage level; the registry's handlers keep it from
/// being hit in the normal flow.
pub const CREATE_GROUP_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS groups (
    id       UUID PRIMARY KEY,
    name     VARCHAR(255) NOT NULL,
    title    VARCHAR(255) NOT NULL,
    owner_id UUID NOT NULL,
    version  BIGINT NOT NULL,
    UNIQUE (owner_id, name)
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id  UUID NOT NULL REFERENCES groups (id) ON DELETE CASCADE,
    player_id UUID NOT NULL UNIQUE,
    position  BIGINT NOT NULL,
    PRIMARY KEY (group_id, player_id)
);
";

/// SQL to create the quest definition tables.
pub const CREATE_QUEST_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS quests (
    id         UUID PRIMARY KEY,
    title      VARCHAR(255) NOT NULL,
    start_time TIMESTAMPTZ NOT NULL,
    end_time   TIMESTAMPTZ NOT NULL,
    version    BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quests_window
    ON quests (start_time, end_time);

CREATE TABLE IF NOT EXISTS quest_levels (
    id          UUID PRIMARY KEY,
    quest_id    UUID NOT NULL REFERENCES quests (id) ON DELETE CASCADE,
    bonus       BIGINT NOT NULL,
    level_index BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS level_questions (
    level_id    UUID NOT NULL REFERENCES quest_levels (id) ON DELETE CASCADE,
    question_id UUID NOT NULL,
    position    BIGINT NOT NULL,
    PRIMARY KEY (level_id, question_id)
);
";

/// SQL to create the quest status tables.
///
/// The unique (group, quest) pair makes a concurrent duplicate start fail
/// inside the insert transaction instead of racing.
pub const CREATE_STATUS_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS quest_statuses (
    id       UUID PRIMARY KEY,
    group_id UUID NOT NULL,
    quest_id UUID NOT NULL,
    version  BIGINT NOT NULL,
    UNIQUE (group_id, quest_id)
);

CREATE TABLE IF NOT EXISTS level_statuses (
    id                  UUID PRIMARY KEY,
    status_id           UUID NOT NULL REFERENCES quest_statuses (id) ON DELETE CASCADE,
    level_id            UUID NOT NULL,
    level_index         BIGINT NOT NULL,
    bonus               BIGINT NOT NULL,
    points_per_question BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS question_statuses (
    id              UUID PRIMARY KEY,
    level_status_id UUID NOT NULL REFERENCES level_statuses (id) ON DELETE CASCADE,
    question_id     UUID NOT NULL,
    question_index  BIGINT NOT NULL,
    lock_state      VARCHAR(16) NOT NULL
);
";

/// SQL to create the outbound event table consumed by the scoring ledger
/// and activity feed.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS domain_events (
    event_id        UUID PRIMARY KEY,
    aggregate_id    UUID NOT NULL,
    event_type      VARCHAR(255) NOT NULL,
    payload         JSONB NOT NULL,
    sequence_number BIGINT NOT NULL,
    correlation_id  UUID NOT NULL,
    causation_id    UUID NOT NULL,
    occurred_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (aggregate_id, sequence_number)
);

CREATE INDEX IF NOT EXISTS idx_domain_events_aggregate_id
    ON domain_events (aggregate_id, sequence_number);

CREATE INDEX IF NOT EXISTS idx_domain_events_correlation_id
    ON domain_events (correlation_id);
";

/// Creates every Questline table if it does not already exist.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` when a statement fails.
pub async fn init_schema(pool: &PgPool) -> Result<(), DomainError> {
    for statements in [
        CREATE_GROUP_TABLES,
        CREATE_QUEST_TABLES,
        CREATE_STATUS_TABLES,
        CREATE_EVENTS_TABLE,
    ] {
        sqlx::raw_sql(statements)
            .execute(pool)
            .await
            .map_err(infra)?;
    }
    Ok(())
}

//! Questline — `PostgreSQL` persistence.
//!
//! One repository per bounded context, each rebuilding aggregates from rows
//! through `from_state`. The schema carries the constraints the domain
//! relies on: a unique member relation backing the single-group invariant
//! and a unique (group, quest) pair backing start-once semantics.

pub mod pg_event_publisher;
pub mod pg_group_repository;
pub mod pg_quest_repository;
pub mod pg_status_repository;
pub mod schema;

pub use pg_event_publisher::PgEventPublisher;
pub use pg_group_repository::PgGroupRepository;
pub use pg_quest_repository::PgQuestRepository;
pub use pg_status_repository::PgStatusRepository;

use questline_core::error::DomainError;

pub(crate) fn infra(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
}

pub(crate) fn column_u32(value: i64, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::Infrastructure(format!("column {column} out of range: {value}")))
}

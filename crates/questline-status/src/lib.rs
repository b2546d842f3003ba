//! Questline — Quest Status Engine bounded context.
//!
//! Materializes a group's progression tree for a quest (one `LevelStatus`
//! per level, one `QuestionStatus` per question), enforces the
//! Locked → Unlocked → Answered state machine, and computes progress and
//! completion. Depends on the Group Registry to validate groups and on the
//! Quest Definition Store to read level/question structure.

pub mod application;
pub mod domain;

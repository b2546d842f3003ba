//! Questline — Quest Definition Store bounded context.
//!
//! Owns quests, their ordered levels, and each level's question references.
//! Also answers the quest-availability query: which quest's time window
//! contains the current moment. Question content stays external; only
//! opaque references are stored.

pub mod application;
pub mod domain;

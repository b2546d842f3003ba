//! Questline — Group Registry bounded context.
//!
//! Owns group creation, membership, and ownership transfer. Enforces the
//! single-group invariant: a player belongs to at most one group at a time.

pub mod application;
pub mod domain;

//! Domain layer for the Quest Definition Store context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod repository;

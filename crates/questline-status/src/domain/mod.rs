//! Domain layer for the Quest Status Engine context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod repository;

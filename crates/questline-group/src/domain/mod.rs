//! Domain layer for the Group Registry context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod repository;

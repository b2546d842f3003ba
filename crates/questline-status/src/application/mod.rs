//! Application layer for the Quest Status Engine context.

pub mod command_handlers;
pub mod query_handlers;

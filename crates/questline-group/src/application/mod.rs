//! Application layer for the Group Registry context.

pub mod command_handlers;
pub mod query_handlers;

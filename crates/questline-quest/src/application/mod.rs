//! Application layer for the Quest Definition Store context.

pub mod command_handlers;
pub mod query_handlers;

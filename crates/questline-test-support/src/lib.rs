//! Shared test mocks and utilities for the Questline engine.

mod clock;
mod publisher;
mod repository;

pub use clock::FixedClock;
pub use publisher::{FailingPublisher, RecordingPublisher};
pub use repository::{
    InMemoryGroupRepository, InMemoryQuestRepository, InMemoryQuestStatusRepository,
};

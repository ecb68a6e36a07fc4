//! Domain layer - pure business logic with no I/O dependencies.

pub mod assistant;
pub mod foundation;

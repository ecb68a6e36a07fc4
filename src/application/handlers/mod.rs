//! Command handlers.

pub mod assistant;

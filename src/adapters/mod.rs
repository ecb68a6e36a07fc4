//! Infrastructure adapters implementing the port traits.

pub mod ai;
pub mod memory;
pub mod postgres;

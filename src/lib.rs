//! School Scout - Conversational School Search Assistant
//!
//! This crate implements a multi-turn slot-filling dialogue engine that uses
//! a language model to progressively extract a structured school-search query
//! from free-form user text, validates it against a reference taxonomy, and
//! decides when enough information has been gathered to run a search.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

//! Snapshot of the reference taxonomy relevant to one form state.
//!
//! The taxonomy itself lives behind the [`TaxonomyService`] port; handlers
//! resolve the lookups that matter for the current form (the chosen city's
//! districts, the chosen group's types, and so on) into this value so the
//! context builder and the validator stay pure.
//!
//! [`TaxonomyService`]: crate::ports::TaxonomyService

use std::collections::BTreeMap;

/// Valid taxonomy values scoped to the current form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyView {
    /// All known cities.
    pub cities: Vec<String>,
    /// Districts of the currently chosen city; empty when no city is known.
    pub districts: Vec<String>,
    /// All institution-type groups.
    pub institution_type_groups: Vec<String>,
    /// Types within the currently chosen group; empty when no group is known.
    pub institution_types: Vec<String>,
    /// Property groups (id -> name) of the chosen institution type.
    pub property_groups: BTreeMap<String, String>,
    /// Properties (id -> name) of the chosen property group.
    pub properties: BTreeMap<String, String>,
}

impl TaxonomyView {
    /// True when a value case-insensitively matches one of the candidates.
    pub fn contains(candidates: &[String], value: &str) -> bool {
        let needle = value.to_lowercase();
        candidates.iter().any(|c| c.to_lowercase() == needle)
    }
}

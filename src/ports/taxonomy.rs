//! Port for the reference taxonomy of cities, institutions, and properties.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced by taxonomy lookups.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("taxonomy lookup failed: {0}")]
    Lookup(String),
}

impl TaxonomyError {
    pub fn lookup(message: impl Into<String>) -> Self {
        TaxonomyError::Lookup(message.into())
    }
}

/// Read access to the school-search taxonomy.
///
/// Lookups keyed by a parent value return the empty collection for an
/// unknown parent; only infrastructure failures are errors.
#[async_trait]
pub trait TaxonomyService: Send + Sync {
    /// All known city names.
    async fn cities(&self) -> Result<Vec<String>, TaxonomyError>;

    /// Districts of the given city.
    async fn districts(&self, city: &str) -> Result<Vec<String>, TaxonomyError>;

    /// All institution-type group names.
    async fn institution_type_groups(&self) -> Result<Vec<String>, TaxonomyError>;

    /// Institution types within the given group.
    async fn institution_types(&self, group: &str) -> Result<Vec<String>, TaxonomyError>;

    /// Property groups (id -> name) applicable to the given institution type.
    async fn property_groups(
        &self,
        institution_type: &str,
    ) -> Result<BTreeMap<String, String>, TaxonomyError>;

    /// Properties (id -> name) within the given property group.
    async fn properties(
        &self,
        property_group: &str,
    ) -> Result<BTreeMap<String, String>, TaxonomyError>;
}

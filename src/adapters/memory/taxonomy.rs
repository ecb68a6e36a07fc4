//! In-memory taxonomy backed by hand-built fixture maps.
//!
//! Parent lookups are keyed case-insensitively so "ankara" finds the
//! districts of "Ankara" regardless of how the model capitalized it.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::ports::{TaxonomyError, TaxonomyService};

/// Fixture-backed taxonomy.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaxonomy {
    cities: Vec<String>,
    districts: HashMap<String, Vec<String>>,
    institution_type_groups: Vec<String>,
    institution_types: HashMap<String, Vec<String>>,
    property_groups: HashMap<String, BTreeMap<String, String>>,
    properties: HashMap<String, BTreeMap<String, String>>,
}

fn key(value: &str) -> String {
    value.to_lowercase()
}

impl InMemoryTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: impl Into<String>, districts: &[&str]) -> Self {
        let city = city.into();
        self.districts.insert(
            key(&city),
            districts.iter().map(|d| d.to_string()).collect(),
        );
        self.cities.push(city);
        self
    }

    pub fn with_institution_group(mut self, group: impl Into<String>, types: &[&str]) -> Self {
        let group = group.into();
        self.institution_types
            .insert(key(&group), types.iter().map(|t| t.to_string()).collect());
        self.institution_type_groups.push(group);
        self
    }

    /// Registers the property groups (id, name) of an institution type.
    pub fn with_property_groups(
        mut self,
        institution_type: impl Into<String>,
        groups: &[(&str, &str)],
    ) -> Self {
        self.property_groups.insert(
            key(&institution_type.into()),
            groups
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        );
        self
    }

    /// Registers the properties (id, name) of a property group.
    pub fn with_properties(
        mut self,
        property_group: impl Into<String>,
        properties: &[(&str, &str)],
    ) -> Self {
        self.properties.insert(
            key(&property_group.into()),
            properties
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        );
        self
    }

    /// A small Turkish fixture used across tests.
    pub fn fixture() -> Self {
        Self::new()
            .with_city("İstanbul", &["Kadıköy", "Üsküdar", "Beşiktaş"])
            .with_city("Ankara", &["Çankaya", "Keçiören"])
            .with_city("İzmir", &["Konak", "Bornova"])
            .with_institution_group("Okul", &["Anaokulu", "İlkokul", "Ortaokul", "Lise"])
            .with_institution_group("Kurs", &["Dil Kursu", "Sanat Kursu"])
            .with_property_groups("Lise", &[("1", "Spor"), ("2", "Akademik")])
            .with_property_groups("İlkokul", &[("1", "Spor")])
            .with_properties("Spor", &[("10", "Yüzme Havuzu"), ("11", "Basketbol Sahası")])
            .with_properties("Akademik", &[("20", "Robotik Atölyesi")])
    }
}

#[async_trait]
impl TaxonomyService for InMemoryTaxonomy {
    async fn cities(&self) -> Result<Vec<String>, TaxonomyError> {
        Ok(self.cities.clone())
    }

    async fn districts(&self, city: &str) -> Result<Vec<String>, TaxonomyError> {
        Ok(self.districts.get(&key(city)).cloned().unwrap_or_default())
    }

    async fn institution_type_groups(&self) -> Result<Vec<String>, TaxonomyError> {
        Ok(self.institution_type_groups.clone())
    }

    async fn institution_types(&self, group: &str) -> Result<Vec<String>, TaxonomyError> {
        Ok(self
            .institution_types
            .get(&key(group))
            .cloned()
            .unwrap_or_default())
    }

    async fn property_groups(
        &self,
        institution_type: &str,
    ) -> Result<BTreeMap<String, String>, TaxonomyError> {
        Ok(self
            .property_groups
            .get(&key(institution_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn properties(
        &self,
        property_group: &str,
    ) -> Result<BTreeMap<String, String>, TaxonomyError> {
        Ok(self
            .properties
            .get(&key(property_group))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_exposes_cities_and_districts() {
        let taxonomy = InMemoryTaxonomy::fixture();

        let cities = taxonomy.cities().await.unwrap();
        assert!(cities.contains(&"İstanbul".to_string()));

        let districts = taxonomy.districts("İstanbul").await.unwrap();
        assert!(districts.contains(&"Kadıköy".to_string()));
    }

    #[tokio::test]
    async fn parent_lookups_are_case_insensitive() {
        let taxonomy = InMemoryTaxonomy::fixture();

        let districts = taxonomy.districts("ankara").await.unwrap();
        assert_eq!(districts, vec!["Çankaya", "Keçiören"]);
    }

    #[tokio::test]
    async fn unknown_parent_yields_empty() {
        let taxonomy = InMemoryTaxonomy::fixture();

        assert!(taxonomy.districts("Bursa").await.unwrap().is_empty());
        assert!(taxonomy.institution_types("Akademi").await.unwrap().is_empty());
        assert!(taxonomy.properties("Sanat").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn property_groups_map_ids_to_names() {
        let taxonomy = InMemoryTaxonomy::fixture();

        let groups = taxonomy.property_groups("Lise").await.unwrap();
        assert_eq!(groups.get("1").map(String::as_str), Some("Spor"));
        assert_eq!(groups.get("2").map(String::as_str), Some("Akademik"));
    }
}

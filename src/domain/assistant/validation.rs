//! Taxonomy validation with fuzzy-match suggestions.
//!
//! Checks merged form data against the reference taxonomy. Errors are
//! blocking (the turn re-prompts the user instead of advancing); warnings
//! are informational. Errors fire on present-but-invalid values; slots that
//! are merely unfilled are driven by the slot plan and the missing-field
//! list, not by validation.

use super::form_data::SearchFormData;
use super::taxonomy_view::TaxonomyView;

/// A blocking, field-scoped validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
    /// Closest valid value, when one is near enough to be useful.
    pub suggestion: Option<String>,
}

/// A non-blocking, field-scoped validation warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWarning {
    pub field: &'static str,
    pub message: String,
}

/// Outcome of validating a form against the taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
    pub warnings: Vec<FieldWarning>,
}

impl ValidationReport {
    /// True when no blocking error was found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary of the errors, used to re-prompt the user.
    pub fn summary(&self) -> String {
        let mut lines = vec!["I could not match part of your request:".to_string()];
        for error in &self.errors {
            match &error.suggestion {
                Some(suggestion) => lines.push(format!(
                    "- {} (did you mean \"{}\"?)",
                    error.message, suggestion
                )),
                None => lines.push(format!("- {}", error.message)),
            }
        }
        lines.join("\n")
    }

    fn error(&mut self, field: &'static str, message: String, suggestion: Option<String>) {
        self.errors.push(FieldError {
            field,
            message,
            suggestion,
        });
    }

    fn warning(&mut self, field: &'static str, message: impl Into<String>) {
        self.warnings.push(FieldWarning {
            field,
            message: message.into(),
        });
    }
}

/// Validates form data against a taxonomy snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Runs every rule independently and collects the results.
    pub fn validate(form: &SearchFormData, view: &TaxonomyView) -> ValidationReport {
        let mut report = ValidationReport::default();

        let city_valid = match &form.city {
            Some(city) if !TaxonomyView::contains(&view.cities, city) => {
                report.error(
                    "city",
                    format!("\"{}\" is not a city I recognize", city),
                    closest_match(city, &view.cities),
                );
                false
            }
            Some(_) => true,
            None => false,
        };

        match &form.district {
            Some(district) if city_valid => {
                if !TaxonomyView::contains(&view.districts, district) {
                    report.error(
                        "district",
                        format!(
                            "\"{}\" is not a district of {}",
                            district,
                            form.city.as_deref().unwrap_or_default()
                        ),
                        closest_match(district, &view.districts),
                    );
                }
            }
            Some(_) => {}
            None => report.warning("district", "no district chosen; searching the whole city"),
        }

        let group_valid = match &form.institution_type_group {
            Some(group) if !TaxonomyView::contains(&view.institution_type_groups, group) => {
                report.error(
                    "institution_type_group",
                    format!("\"{}\" is not a known institution group", group),
                    closest_match(group, &view.institution_type_groups),
                );
                false
            }
            Some(_) => true,
            None => false,
        };

        if let Some(kind) = &form.institution_type {
            if group_valid && !TaxonomyView::contains(&view.institution_types, kind) {
                report.error(
                    "institution_type",
                    format!(
                        "\"{}\" is not an institution type under {}",
                        kind,
                        form.institution_type_group.as_deref().unwrap_or_default()
                    ),
                    closest_match(kind, &view.institution_types),
                );
            }
        }

        if form.property_group.is_some() && form.properties.is_empty() {
            report.error(
                "properties",
                format!(
                    "at least one property must be selected for the \"{}\" group",
                    form.property_group.as_deref().unwrap_or_default()
                ),
                None,
            );
        }

        if let (Some(min), Some(max)) = (form.min_price, form.max_price) {
            if min > max {
                report.error(
                    "price_range",
                    format!("minimum price {} exceeds maximum price {}", min, max),
                    None,
                );
            }
        }

        if form.min_price.is_none() && form.max_price.is_none() {
            report.warning("price_range", "no price range given; all price bands included");
        }

        report
    }
}

/// Finds the candidate closest to the input.
///
/// Candidates whose lower-cased form starts with the lower-cased input win
/// immediately. Otherwise the candidate with the minimum edit distance is
/// returned, unless that distance exceeds the input's character length, in
/// which case nothing is similar enough to suggest.
pub fn closest_match(input: &str, candidates: &[String]) -> Option<String> {
    let needle = input.to_lowercase();

    if let Some(prefixed) = candidates
        .iter()
        .find(|c| c.to_lowercase().starts_with(&needle))
    {
        return Some(prefixed.clone());
    }

    let best = candidates
        .iter()
        .map(|c| (edit_distance(&needle, &c.to_lowercase()), c))
        .min_by_key(|(distance, _)| *distance)?;

    if best.0 > input.chars().count() {
        return None;
    }
    Some(best.1.clone())
}

/// Classic insert/delete/substitute edit distance with unit costs.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

//! Merge engine for form-data fragments.
//!
//! Combines a newly extracted fragment with the previously known form data.
//! A present (non-null, non-empty) incoming value overrides the existing
//! one; an absent or empty incoming value leaves the existing value
//! untouched, so information is never lost to a weak extraction.

use super::form_data::SearchFormData;

/// Merges `incoming` on top of `existing`, field by field.
///
/// The selected-properties list is whole-value replacement: a non-empty
/// incoming list replaces the existing list entirely, an empty one preserves
/// it. No element-wise union is attempted. The derived state is recomputed
/// on the result.
///
/// Merging is idempotent (`merge(merge(a, b), b) == merge(a, b)`) and the
/// completion percentage never decreases across merges that only add
/// information.
pub fn merge(existing: &SearchFormData, incoming: &SearchFormData) -> SearchFormData {
    let mut merged = existing.clone();

    merge_text(&mut merged.city, &incoming.city);
    merge_text(&mut merged.district, &incoming.district);
    merge_text(&mut merged.institution_type_group, &incoming.institution_type_group);
    merge_text(&mut merged.institution_type, &incoming.institution_type);
    merge_text(&mut merged.property_group, &incoming.property_group);
    merge_text(&mut merged.explanation, &incoming.explanation);
    merge_text(&mut merged.user_message, &incoming.user_message);

    if !incoming.properties.is_empty() {
        merged.properties = incoming.properties.clone();
    }
    if incoming.min_price.is_some() {
        merged.min_price = incoming.min_price;
    }
    if incoming.max_price.is_some() {
        merged.max_price = incoming.max_price;
    }
    if incoming.next_step.is_some() {
        merged.next_step = incoming.next_step;
    }
    if !incoming.missing_fields.is_empty() {
        merged.missing_fields = incoming.missing_fields.clone();
    }

    merged.recompute();
    merged
}

fn merge_text(existing: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        if !value.trim().is_empty() {
            *existing = Some(value.clone());
        }
    }
}

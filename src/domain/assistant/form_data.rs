//! Search form data value object.
//!
//! The accumulated school-search query being filled over the course of a
//! conversation. Serialized as a versioned blob embedded in the conversation
//! record, and also attached to assistant messages as the per-turn extracted
//! fragment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current version of the serialized form-data blob.
pub const FORM_DATA_VERSION: u32 = 1;

/// Number of slots counted towards the completion percentage.
pub const TRACKED_SLOT_COUNT: u8 = 6;

/// The slot the assistant will ask about next.
///
/// A closed set of named slot identifiers plus an explicit `Complete`
/// variant. `Unknown` is the catch-all for unrecognized model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStep {
    City,
    District,
    InstitutionTypeGroup,
    InstitutionType,
    PriceRange,
    PropertyGroup,
    Properties,
    Complete,
    #[serde(other)]
    Unknown,
}

impl SlotStep {
    /// Returns the wire name of the step.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStep::City => "city",
            SlotStep::District => "district",
            SlotStep::InstitutionTypeGroup => "institution_type_group",
            SlotStep::InstitutionType => "institution_type",
            SlotStep::PriceRange => "price_range",
            SlotStep::PropertyGroup => "property_group",
            SlotStep::Properties => "properties",
            SlotStep::Complete => "complete",
            SlotStep::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SlotStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-slot fill indicators, one per tracked slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillFlags {
    pub city: bool,
    pub district: bool,
    pub institution_type_group: bool,
    pub institution_type: bool,
    pub properties: bool,
    pub price: bool,
}

/// The accumulated school-search query.
///
/// Invariant: `flags`, `completion_percentage`, and
/// `meets_minimum_requirements` are always a pure function of the other
/// fields. Every constructor and mutation path calls [`recompute`] to
/// enforce this; they are never set independently.
///
/// [`recompute`]: SearchFormData::recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFormData {
    pub version: u32,
    pub city: Option<String>,
    pub district: Option<String>,
    pub institution_type_group: Option<String>,
    pub institution_type: Option<String>,
    pub property_group: Option<String>,
    /// Ordered set of selected property names; duplicates are dropped on
    /// recompute, first occurrence wins.
    pub properties: Vec<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    /// Free-text explanation of what the user is looking for.
    pub explanation: Option<String>,
    pub next_step: Option<SlotStep>,
    /// User-facing assistant message for this turn.
    pub user_message: Option<String>,
    /// Names of slots the model still considers unfilled.
    pub missing_fields: Vec<String>,
    pub flags: FillFlags,
    pub completion_percentage: u8,
    pub meets_minimum_requirements: bool,
}

impl Default for SearchFormData {
    fn default() -> Self {
        Self {
            version: FORM_DATA_VERSION,
            city: None,
            district: None,
            institution_type_group: None,
            institution_type: None,
            property_group: None,
            properties: Vec::new(),
            min_price: None,
            max_price: None,
            explanation: None,
            next_step: None,
            user_message: None,
            missing_fields: Vec::new(),
            flags: FillFlags::default(),
            completion_percentage: 0,
            meets_minimum_requirements: false,
        }
    }
}

impl SearchFormData {
    /// Creates an empty form with `next_step` unset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the form handed out on a conversation's first turn.
    pub fn initial() -> Self {
        let mut form = Self::default();
        form.next_step = Some(SlotStep::City);
        form.recompute();
        form
    }

    /// Normalizes fields and recomputes the derived state.
    ///
    /// Blank strings collapse to `None`, duplicate properties are dropped,
    /// then the fill flags, completion percentage, and the
    /// minimum-requirements flag are derived from field presence.
    pub fn recompute(&mut self) {
        normalize(&mut self.city);
        normalize(&mut self.district);
        normalize(&mut self.institution_type_group);
        normalize(&mut self.institution_type);
        normalize(&mut self.property_group);
        normalize(&mut self.explanation);
        dedup_preserving_order(&mut self.properties);

        self.flags = FillFlags {
            city: self.city.is_some(),
            district: self.district.is_some(),
            institution_type_group: self.institution_type_group.is_some(),
            institution_type: self.institution_type.is_some(),
            properties: !self.properties.is_empty(),
            price: self.min_price.is_some() || self.max_price.is_some(),
        };

        self.completion_percentage =
            (u16::from(self.filled_slot_count()) * 100 / u16::from(TRACKED_SLOT_COUNT)) as u8;
        self.meets_minimum_requirements = self.flags.city
            && self.flags.institution_type_group
            && self.flags.institution_type;
    }

    /// Number of tracked slots currently filled (0..=6).
    pub fn filled_slot_count(&self) -> u8 {
        [
            self.flags.city,
            self.flags.district,
            self.flags.institution_type_group,
            self.flags.institution_type,
            self.flags.properties,
            self.flags.price,
        ]
        .iter()
        .filter(|filled| **filled)
        .count() as u8
    }
}

fn normalize(field: &mut Option<String>) {
    if let Some(value) = field {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            *field = None;
        } else if trimmed.len() != value.len() {
            *field = Some(trimmed.to_string());
        }
    }
}

fn dedup_preserving_order(values: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() || seen.iter().any(|s: &String| s == trimmed) {
            false
        } else {
            seen.push(trimmed.to_string());
            true
        }
    });
    for value in values.iter_mut() {
        let trimmed = value.trim();
        if trimmed.len() != value.len() {
            *value = trimmed.to_string();
        }
    }
}

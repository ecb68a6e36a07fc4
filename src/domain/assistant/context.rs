//! Context builder for the model's system prompt.
//!
//! Turns the taxonomy plus current form data into natural-language
//! instructions and enumerated valid options. The dynamic narrowing (once a
//! city is known, list only its districts; once a group is known, list only
//! its types) is what keeps the model's free-text answers constrained to
//! real taxonomy values.

use super::form_data::SearchFormData;
use super::taxonomy_view::TaxonomyView;

/// The output schema the model must emit, as shown in the instructions.
const OUTPUT_SCHEMA: &str = r#"{
  "city": string | null,
  "district": string | null,
  "institution_type_group": string | null,
  "institution_type": string | null,
  "property_group": string | null,
  "properties": [string],
  "min_price": number | null,
  "max_price": number | null,
  "explanation": string | null,
  "next_step": "city" | "district" | "institution_type_group" | "institution_type" | "price_range" | "property_group" | "properties" | "complete",
  "user_message": string,
  "missing_fields": [string]
}"#;

/// Builds the system prompt for one extraction turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    /// Fixed instruction block: the ordered slot plan and the output schema.
    pub fn instruction_block() -> String {
        format!(
            "You are a school-search assistant. Extract search criteria from the \
             user's messages into the JSON object below and fill the slots in this \
             order:\n\
             1. city (required)\n\
             2. district (optional)\n\
             3. institution_type_group (required)\n\
             4. institution_type (required, depends on the chosen group)\n\
             5. price range (optional)\n\
             6. property_group (optional)\n\
             7. properties (required once a property group is chosen)\n\
             Only use values from the option lists provided. Ask about one slot at a \
             time via user_message. When every required slot is filled set next_step \
             to \"complete\". Respond with a single JSON object, no other text:\n{}",
            OUTPUT_SCHEMA
        )
    }

    /// Dynamic block: filled slots with their now-valid child options, and
    /// the full top-level option set for unfilled required slots.
    pub fn options_block(form: &SearchFormData, view: &TaxonomyView) -> String {
        let mut sections = Vec::new();

        match &form.city {
            Some(city) => {
                sections.push(format!("City already chosen: {}", city));
                if form.district.is_none() && !view.districts.is_empty() {
                    sections.push(format!(
                        "Valid districts of {}: {}",
                        city,
                        view.districts.join(", ")
                    ));
                }
            }
            None => sections.push(format!("Valid cities: {}", view.cities.join(", "))),
        }
        if let Some(district) = &form.district {
            sections.push(format!("District already chosen: {}", district));
        }

        match &form.institution_type_group {
            Some(group) => {
                sections.push(format!("Institution group already chosen: {}", group));
                if form.institution_type.is_none() && !view.institution_types.is_empty() {
                    sections.push(format!(
                        "Valid institution types under {}: {}",
                        group,
                        view.institution_types.join(", ")
                    ));
                }
            }
            None => sections.push(format!(
                "Valid institution groups: {}",
                view.institution_type_groups.join(", ")
            )),
        }
        if let Some(kind) = &form.institution_type {
            sections.push(format!("Institution type already chosen: {}", kind));
            if form.property_group.is_none() && !view.property_groups.is_empty() {
                let names: Vec<&str> =
                    view.property_groups.values().map(String::as_str).collect();
                sections.push(format!("Valid property groups: {}", names.join(", ")));
            }
        }
        if let Some(group) = &form.property_group {
            sections.push(format!("Property group already chosen: {}", group));
            if !view.properties.is_empty() {
                let names: Vec<&str> = view.properties.values().map(String::as_str).collect();
                sections.push(format!(
                    "Valid properties in {}: {}",
                    group,
                    names.join(", ")
                ));
            }
        }

        if let (Some(min), Some(max)) = (form.min_price, form.max_price) {
            sections.push(format!("Price range already chosen: {} - {}", min, max));
        }

        sections.join("\n")
    }

    /// Full system prompt: instructions, current options, completion state.
    pub fn system_prompt(form: &SearchFormData, view: &TaxonomyView) -> String {
        let mut prompt = Self::instruction_block();
        prompt.push_str("\n\n");
        prompt.push_str(&Self::options_block(form, view));
        prompt.push_str(&format!(
            "\n\nCompletion: {}% of slots filled.",
            form.completion_percentage
        ));
        if !form.missing_fields.is_empty() {
            prompt.push_str(&format!(
                "\nStill missing: {}.",
                form.missing_fields.join(", ")
            ));
        }
        if let Some(step) = form.next_step {
            prompt.push_str(&format!("\nAsk about next: {}.", step));
        }
        prompt
    }
}

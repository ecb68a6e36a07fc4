//! Response parser for model output.
//!
//! Extracts a structured form-data fragment from the model's raw text.
//! Model output is unreliable: it may wrap JSON in markdown fences, surround
//! it with prose, or not contain JSON at all. The parser degrades gracefully
//! and never fails; a turn is never aborted because of malformed output.

use super::form_data::{SearchFormData, SlotStep};

/// Parses raw model text into a form-data fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Extracts a [`SearchFormData`] fragment from raw model output.
    ///
    /// # Steps
    /// 1. Strip markdown code-fence markers
    /// 2. Isolate the substring from the first `{` to the last `}`
    /// 3. Attempt a structured decode
    ///
    /// On any failure the result is a minimal fragment with
    /// `next_step = Unknown` and the raw text carried verbatim as the
    /// user-facing message. The derived state is recomputed either way.
    pub fn parse(raw: &str) -> SearchFormData {
        match Self::decode(raw) {
            Some(mut form) => {
                form.recompute();
                form
            }
            None => {
                let mut form = SearchFormData::empty();
                form.next_step = Some(SlotStep::Unknown);
                form.user_message = Some(raw.to_string());
                form.recompute();
                form
            }
        }
    }

    fn decode(raw: &str) -> Option<SearchFormData> {
        let stripped = Self::strip_code_fences(raw);
        let isolated = Self::isolate_object(&stripped)?;
        serde_json::from_str(isolated).ok()
    }

    /// Removes ```json / ``` fence markers, keeping the fenced content.
    fn strip_code_fences(raw: &str) -> String {
        let mut result = raw.replace("```json", "");
        if result.contains("```") {
            result = result.replace("```", "");
        }
        result
    }

    /// Best-effort JSON isolation: first `{` to last `}` inclusive.
    fn isolate_object(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }
        Some(&text[start..=end])
    }
}

//! Slot-filling search assistant domain.
//!
//! Contains the form-data value object, the response parser, the merge
//! engine, the taxonomy validator, the context builder, the context window
//! manager, and the conversation aggregate.

mod context;
mod conversation;
mod form_data;
mod merge;
mod parser;
mod taxonomy_view;
mod validation;
mod window;

pub use context::ContextBuilder;
pub use conversation::{
    Conversation, ConversationKind, ConversationStatus, Message, MessageRole, UnknownVariant,
};
pub use form_data::{FillFlags, SearchFormData, SlotStep, FORM_DATA_VERSION, TRACKED_SLOT_COUNT};
pub use merge::merge;
pub use parser::ResponseParser;
pub use taxonomy_view::TaxonomyView;
pub use validation::{FieldError, FieldWarning, ValidationReport, Validator};
pub use window::{CharLengthEstimator, ContextWindow, TokenEstimator};

//! Port traits decoupling the application core from infrastructure.

pub mod conversation_store;
pub mod model_client;
pub mod taxonomy;

pub use conversation_store::{ConversationStore, StoreError};
pub use model_client::{ChatMessage, ChatRole, ModelClient, ModelError, ModelReply};
pub use taxonomy::{TaxonomyError, TaxonomyService};

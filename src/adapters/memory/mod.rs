//! In-memory adapters for tests and local development.

pub mod conversation_store;
pub mod taxonomy;

pub use conversation_store::InMemoryConversationStore;
pub use taxonomy::InMemoryTaxonomy;

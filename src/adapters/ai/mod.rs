//! Model backend adapters.

pub mod mock_client;
pub mod ollama_client;

pub use mock_client::{MockModelClient, MockModelError};
pub use ollama_client::{OllamaClient, OllamaConfig};

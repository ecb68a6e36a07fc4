//! SweepIdle command handler.
//!
//! Periodic housekeeping: active conversations with no message for longer
//! than the configured threshold are marked abandoned.

use std::sync::Arc;
use tracing::info;

use crate::ports::{ConversationStore, StoreError};

/// Abandons conversations idle past a threshold.
pub struct SweepIdleHandler {
    store: Arc<dyn ConversationStore>,
    idle_threshold: chrono::Duration,
}

impl SweepIdleHandler {
    pub fn new(store: Arc<dyn ConversationStore>, idle_threshold: chrono::Duration) -> Self {
        Self {
            store,
            idle_threshold,
        }
    }

    /// Runs one sweep, returning how many conversations were abandoned.
    pub async fn handle(&self) -> Result<u64, StoreError> {
        let swept = self.store.sweep_idle(self.idle_threshold).await?;
        if swept > 0 {
            info!(count = swept, "abandoned idle conversations");
        }
        Ok(swept)
    }
}

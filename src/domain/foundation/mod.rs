//! Foundation types shared across the domain.

mod ids;
mod timestamp;

pub use ids::{ConversationId, InvalidUserId, MessageId, UserId};
pub use timestamp::Timestamp;

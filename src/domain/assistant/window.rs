//! Context window manager.
//!
//! Bounds the conversation history sent to the model, first by message
//! count and then by an estimated token budget. Token estimation sits
//! behind a trait so the length heuristic can be swapped for a real
//! tokenizer without touching the trimming algorithm.

use super::conversation::Message;

/// Estimates the token cost of a piece of text.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> u32;
}

/// Length-based token estimate: character count over a language-tuned
/// divisor, rounded up. Agglutinative languages pack more characters per
/// token than English, hence the low default divisor.
#[derive(Debug, Clone, Copy)]
pub struct CharLengthEstimator {
    chars_per_token: f32,
}

impl CharLengthEstimator {
    pub fn new(chars_per_token: f32) -> Self {
        Self { chars_per_token }
    }
}

impl Default for CharLengthEstimator {
    fn default() -> Self {
        Self::new(2.5)
    }
}

impl TokenEstimator for CharLengthEstimator {
    fn estimate(&self, text: &str) -> u32 {
        (text.chars().count() as f32 / self.chars_per_token).ceil() as u32
    }
}

/// Two-stage history trimmer.
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow {
    max_messages: usize,
    token_budget: u32,
}

impl ContextWindow {
    pub fn new(max_messages: usize, token_budget: u32) -> Self {
        Self {
            max_messages,
            token_budget,
        }
    }

    /// Trims history for one model call.
    ///
    /// Stage one caps the history to the most recent `max_messages`. Stage
    /// two walks from the newest message backward, accumulating estimated
    /// token cost, and stops before the budget would be exceeded. The
    /// retained subsequence is returned in original chronological order.
    pub fn trim<'a>(
        &self,
        messages: &'a [Message],
        estimator: &dyn TokenEstimator,
    ) -> Vec<&'a Message> {
        let capped = if messages.len() > self.max_messages {
            &messages[messages.len() - self.max_messages..]
        } else {
            messages
        };

        let mut spent: u32 = 0;
        let mut retained: Vec<&Message> = Vec::with_capacity(capped.len());
        for message in capped.iter().rev() {
            let cost = estimator.estimate(&message.content);
            if spent.saturating_add(cost) > self.token_budget {
                break;
            }
            spent += cost;
            retained.push(message);
        }
        retained.reverse();
        retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;

    fn message(content: &str) -> Message {
        Message::user(ConversationId::new(), content.to_string(), 0)
    }

    fn history(contents: &[&str]) -> Vec<Message> {
        contents.iter().map(|c| message(c)).collect()
    }

    /// One token per character, for predictable arithmetic.
    struct UnitEstimator;

    impl TokenEstimator for UnitEstimator {
        fn estimate(&self, text: &str) -> u32 {
            text.chars().count() as u32
        }
    }

    #[test]
    fn keeps_everything_within_both_limits() {
        let messages = history(&["aa", "bb", "cc"]);
        let window = ContextWindow::new(10, 100);
        let trimmed = window.trim(&messages, &UnitEstimator);
        assert_eq!(trimmed.len(), 3);
    }

    #[test]
    fn caps_to_most_recent_message_count() {
        let messages = history(&["1", "2", "3", "4", "5"]);
        let window = ContextWindow::new(3, 100);
        let trimmed = window.trim(&messages, &UnitEstimator);

        let contents: Vec<&str> = trimmed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["3", "4", "5"]);
    }

    #[test]
    fn drops_oldest_messages_over_token_budget() {
        let messages = history(&["aaaa", "bbbb", "cccc"]);
        let window = ContextWindow::new(10, 9);
        let trimmed = window.trim(&messages, &UnitEstimator);

        let contents: Vec<&str> = trimmed.iter().map(|m| m.content.as_str()).collect();
        // newest two fit (8 tokens), adding the oldest would exceed 9
        assert_eq!(contents, vec!["bbbb", "cccc"]);
    }

    #[test]
    fn never_exceeds_the_budget() {
        let messages = history(&["aaa", "bbbbb", "cc", "dddd", "e"]);
        let window = ContextWindow::new(10, 7);
        let trimmed = window.trim(&messages, &UnitEstimator);

        let total: u32 = trimmed
            .iter()
            .map(|m| UnitEstimator.estimate(&m.content))
            .sum();
        assert!(total <= 7);
    }

    #[test]
    fn preserves_chronological_order() {
        let messages = history(&["first", "second", "third", "fourth"]);
        let window = ContextWindow::new(3, 100);
        let trimmed = window.trim(&messages, &UnitEstimator);

        let contents: Vec<&str> = trimmed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "third", "fourth"]);
    }

    #[test]
    fn keeps_newest_message_when_it_alone_fits() {
        let messages = history(&["a very long older message", "short"]);
        let window = ContextWindow::new(10, 5);
        let trimmed = window.trim(&messages, &UnitEstimator);

        let contents: Vec<&str> = trimmed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["short"]);
    }

    #[test]
    fn yields_empty_when_even_newest_is_too_large() {
        let messages = history(&["this will not fit at all"]);
        let window = ContextWindow::new(10, 3);
        let trimmed = window.trim(&messages, &UnitEstimator);
        assert!(trimmed.is_empty());
    }

    #[test]
    fn char_length_estimator_rounds_up() {
        let estimator = CharLengthEstimator::new(2.5);
        assert_eq!(estimator.estimate(""), 0);
        assert_eq!(estimator.estimate("abcde"), 2);
        assert_eq!(estimator.estimate("abcdef"), 3);
    }
}

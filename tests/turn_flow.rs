//! Integration tests for the full slot-filling turn flow.
//!
//! Exercises the turn handler end to end against the in-memory store, the
//! fixture taxonomy, and a scripted model: welcome turn, extraction,
//! validation re-prompts, completion, and failure fallback.

use std::sync::Arc;

use school_scout::adapters::ai::{MockModelClient, MockModelError};
use school_scout::adapters::memory::{InMemoryConversationStore, InMemoryTaxonomy};
use school_scout::application::handlers::assistant::{
    SubmitMessageCommand, SubmitMessageHandler, SweepIdleHandler, APOLOGY_MESSAGE, WELCOME_MESSAGE,
};
use school_scout::domain::assistant::{
    CharLengthEstimator, ContextWindow, ConversationStatus, MessageRole, SlotStep,
};
use school_scout::domain::foundation::{Timestamp, UserId};
use school_scout::ports::ConversationStore;

fn build_handler(
    model: MockModelClient,
) -> (SubmitMessageHandler, Arc<InMemoryConversationStore>) {
    let store = Arc::new(InMemoryConversationStore::new());
    let handler = SubmitMessageHandler::new(
        store.clone(),
        Arc::new(model),
        Arc::new(InMemoryTaxonomy::fixture()),
        Arc::new(CharLengthEstimator::default()),
        ContextWindow::new(10, 2048),
    );
    (handler, store)
}

fn alice() -> UserId {
    UserId::new("alice").unwrap()
}

#[tokio::test]
async fn full_dialogue_fills_the_form_over_three_turns() {
    let model = MockModelClient::new()
        .with_reply(
            r#"{"city":"İstanbul","district":"Beşiktaş","next_step":"institution_type_group","user_message":"Hangi tür kurum arıyorsunuz?"}"#,
        )
        .with_reply(
            r#"{"institution_type_group":"Okul","institution_type":"Lise","next_step":"price_range","user_message":"Fiyat aralığınız nedir?"}"#,
        )
        .with_reply(
            r#"{"min_price":20000,"max_price":50000,"next_step":"complete","user_message":"Aramanız hazır!"}"#,
        );
    let (handler, store) = build_handler(model);

    // turn 0: welcome, no extraction
    let welcome = handler
        .handle(SubmitMessageCommand::new(alice(), "Merhaba"))
        .await
        .unwrap();
    assert_eq!(welcome.content, WELCOME_MESSAGE);
    assert_eq!(welcome.extracted_form_data.next_step, Some(SlotStep::City));

    // turn 1: city and district
    let turn1 = handler
        .handle(SubmitMessageCommand::new(
            alice(),
            "İstanbul Beşiktaş'ta arıyorum",
        ))
        .await
        .unwrap();
    assert_eq!(turn1.extracted_form_data.city.as_deref(), Some("İstanbul"));
    assert_eq!(
        turn1.extracted_form_data.district.as_deref(),
        Some("Beşiktaş")
    );
    assert_eq!(turn1.extracted_form_data.completion_percentage, 33);
    assert!(!turn1.extracted_form_data.meets_minimum_requirements);

    // turn 2: institution group and type; earlier slots survive
    let turn2 = handler
        .handle(SubmitMessageCommand::new(alice(), "Lise olsun"))
        .await
        .unwrap();
    assert_eq!(turn2.extracted_form_data.city.as_deref(), Some("İstanbul"));
    assert_eq!(
        turn2.extracted_form_data.institution_type.as_deref(),
        Some("Lise")
    );
    assert!(turn2.extracted_form_data.meets_minimum_requirements);
    assert!(!turn2.is_form_complete);

    // turn 3: price range closes the search
    let turn3 = handler
        .handle(SubmitMessageCommand::new(alice(), "20 bin ile 50 bin arası"))
        .await
        .unwrap();
    assert!(turn3.is_form_complete);
    assert_eq!(turn3.extracted_form_data.min_price, Some(20_000));
    assert_eq!(turn3.extracted_form_data.max_price, Some(50_000));
    assert_eq!(turn3.extracted_form_data.completion_percentage, 83);

    let stored = store.find_by_id(turn3.conversation_id).await.unwrap();
    assert_eq!(stored.status, ConversationStatus::Completed);
    // 4 user messages and 4 assistant replies, in order
    assert_eq!(stored.messages.len(), 8);
    let roles: Vec<MessageRole> = stored.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
        ]
    );
}

#[tokio::test]
async fn inverted_price_range_is_rejected_and_the_turn_reprompts() {
    let model = MockModelClient::new()
        .with_reply(
            r#"{"city":"Ankara","institution_type_group":"Okul","institution_type":"Lise","next_step":"price_range","user_message":"Fiyat aralığı?"}"#,
        )
        .with_reply(
            r#"{"min_price":50000,"max_price":20000,"next_step":"complete","user_message":"Tamam."}"#,
        );
    let (handler, store) = build_handler(model);

    handler
        .handle(SubmitMessageCommand::new(alice(), "Merhaba"))
        .await
        .unwrap();
    handler
        .handle(SubmitMessageCommand::new(alice(), "Ankara'da lise"))
        .await
        .unwrap();
    let outcome = handler
        .handle(SubmitMessageCommand::new(alice(), "50 bin ile 20 bin arası"))
        .await
        .unwrap();

    assert!(outcome.content.contains("50000"));
    assert!(outcome.content.contains("20000"));
    assert!(!outcome.is_form_complete);
    assert_eq!(
        outcome.extracted_form_data.next_step,
        Some(SlotStep::PriceRange)
    );

    let stored = store.find_by_id(outcome.conversation_id).await.unwrap();
    assert_eq!(stored.status, ConversationStatus::Active);
}

#[tokio::test]
async fn apology_turn_keeps_the_conversation_usable() {
    let model = MockModelClient::new()
        .with_error(MockModelError::Timeout { timeout_secs: 120 })
        .with_reply(
            r#"{"city":"İzmir","next_step":"institution_type_group","user_message":"Ne tür kurum?"}"#,
        );
    let (handler, store) = build_handler(model);

    handler
        .handle(SubmitMessageCommand::new(alice(), "Merhaba"))
        .await
        .unwrap();

    let failed = handler
        .handle(SubmitMessageCommand::new(alice(), "İzmir"))
        .await
        .unwrap();
    assert_eq!(failed.content, APOLOGY_MESSAGE);

    // the next attempt succeeds in the same conversation
    let retried = handler
        .handle(SubmitMessageCommand::new(alice(), "İzmir"))
        .await
        .unwrap();
    assert_eq!(retried.conversation_id, failed.conversation_id);
    assert_eq!(retried.extracted_form_data.city.as_deref(), Some("İzmir"));

    let stored = store.find_by_id(retried.conversation_id).await.unwrap();
    assert_eq!(stored.status, ConversationStatus::Active);
}

#[tokio::test]
async fn completed_conversation_gives_way_to_a_fresh_one() {
    let model = MockModelClient::new().with_reply(
        r#"{"city":"İstanbul","institution_type_group":"Okul","institution_type":"Lise","next_step":"complete","user_message":"Hazır!"}"#,
    );
    let (handler, _store) = build_handler(model);

    handler
        .handle(SubmitMessageCommand::new(alice(), "Merhaba"))
        .await
        .unwrap();
    let done = handler
        .handle(SubmitMessageCommand::new(alice(), "İstanbul'da lise"))
        .await
        .unwrap();
    assert!(done.is_form_complete);

    // without an explicit id, the next message starts over
    let fresh = handler
        .handle(SubmitMessageCommand::new(alice(), "Yeni arama"))
        .await
        .unwrap();
    assert_ne!(fresh.conversation_id, done.conversation_id);
    assert_eq!(fresh.content, WELCOME_MESSAGE);
}

#[tokio::test]
async fn idle_sweep_then_new_message_starts_a_new_conversation() {
    let (handler, store) = build_handler(MockModelClient::new());

    let first = handler
        .handle(SubmitMessageCommand::new(alice(), "Merhaba"))
        .await
        .unwrap();

    // age the conversation past the threshold
    let mut stale = store.find_by_id(first.conversation_id).await.unwrap();
    stale.last_message_at = Timestamp::now().minus(chrono::Duration::hours(48));
    store.insert(stale);

    let sweeper = SweepIdleHandler::new(store.clone(), chrono::Duration::hours(24));
    assert_eq!(sweeper.handle().await.unwrap(), 1);
    assert_eq!(
        store.find_by_id(first.conversation_id).await.unwrap().status,
        ConversationStatus::Abandoned
    );

    let next = handler
        .handle(SubmitMessageCommand::new(alice(), "Tekrar merhaba"))
        .await
        .unwrap();
    assert_ne!(next.conversation_id, first.conversation_id);
    assert_eq!(next.content, WELCOME_MESSAGE);
}

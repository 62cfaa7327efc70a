use std::sync::Arc;
use tether_memory::{ConversationMemory, UserIntent};
use tether_store_memory::MemoryStore;
use tether_stream::EventStream;
use tether_types::{Action, AgentState, EventDraft, EventId, EventSource, Observation};

async fn open() -> (EventStream, ConversationMemory) {
    let stream = EventStream::open("chat", Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    let memory = ConversationMemory::new(stream.reader());
    (stream, memory)
}

async fn user(stream: &EventStream, draft: impl Into<EventDraft>) {
    stream.append(draft, EventSource::User).await.unwrap();
}

async fn agent(stream: &EventStream, draft: impl Into<EventDraft>) {
    stream.append(draft, EventSource::Agent).await.unwrap();
}

fn id(event: Option<Arc<tether_types::Event>>) -> Option<u64> {
    event.map(|event| event.id.get())
}

// --- User intent ---

#[tokio::test]
async fn first_message_is_the_task_until_something_finishes() {
    let (stream, memory) = open().await;
    assert_eq!(memory.current_user_intent(), None);

    user(&stream, Action::message_text("build the parser")).await;
    agent(&stream, Action::read("grammar.txt")).await;
    user(&stream, Action::message_text("use a lexer too")).await;

    assert_eq!(
        memory.current_user_intent(),
        Some(UserIntent {
            text: "build the parser".into(),
            image_urls: vec![],
        })
    );
}

#[tokio::test]
async fn intent_restarts_after_finish() {
    let (stream, memory) = open().await;
    user(&stream, Action::message_text("first task")).await;
    agent(&stream, Action::finish()).await;
    user(
        &stream,
        Action::Message {
            content: "second task".into(),
            image_urls: vec!["https://example.com/a.png".into()],
            wait_for_response: false,
        },
    )
    .await;
    agent(&stream, Action::read("a.txt")).await;
    user(&stream, Action::message_text("and hurry")).await;

    assert_eq!(
        memory.current_user_intent(),
        Some(UserIntent {
            text: "second task".into(),
            image_urls: vec!["https://example.com/a.png".into()],
        })
    );
}

#[tokio::test]
async fn finish_with_no_new_message_keeps_earlier_intent() {
    let (stream, memory) = open().await;
    user(&stream, Action::message_text("only task")).await;
    agent(&stream, Action::finish()).await;
    assert_eq!(
        memory.current_user_intent().map(|intent| intent.text),
        Some("only task".into())
    );
}

#[tokio::test]
async fn agent_messages_are_not_intent() {
    let (stream, memory) = open().await;
    agent(&stream, Action::message_text("hello, how can I help?")).await;
    assert_eq!(memory.current_user_intent(), None);
}

// --- Last action / observation ---

#[tokio::test]
async fn last_action_skips_the_newest_event() {
    let (stream, memory) = open().await;
    agent(&stream, Action::read("a.txt")).await; // 0
    agent(
        &stream,
        Observation::Read {
            path: "a.txt".into(),
            content: "data".into(),
        },
    )
    .await; // 1
    agent(&stream, Action::write("b.txt", "data")).await; // 2

    assert_eq!(id(memory.last_action(None)), Some(0));
    assert_eq!(id(memory.last_observation(None)), Some(1));
    assert_eq!(id(memory.last_action(Some(EventId::new(3)))), Some(2));
    assert_eq!(id(memory.last_observation(Some(EventId::new(1)))), None);
    assert_eq!(id(memory.last_action(Some(EventId::ZERO))), None);
}

#[tokio::test]
async fn last_action_ignores_hidden_kinds() {
    let (stream, memory) = open().await;
    agent(&stream, Action::read("a.txt")).await; // 0
    agent(&stream, Action::change_state(AgentState::Paused)).await; // 1
    agent(&stream, Action::Null).await; // 2
    agent(&stream, Observation::null("")).await; // 3
    assert_eq!(id(memory.last_action(None)), Some(0));
    assert_eq!(id(memory.last_observation(None)), None);
}

#[tokio::test]
async fn empty_stream_has_nothing() {
    let (_stream, memory) = open().await;
    assert!(memory.last_action(None).is_none());
    assert!(memory.last_observation(None).is_none());
    assert_eq!(memory.last_user_message(), "");
    assert_eq!(memory.last_agent_message(), "");
    assert!(memory.events(false, false).is_empty());
    assert!(memory.last_events(5).is_empty());
}

// --- Messages ---

#[tokio::test]
async fn last_messages_by_source() {
    let (stream, memory) = open().await;
    user(&stream, Action::message_text("hi")).await;
    agent(&stream, Action::message_text("hello")).await;
    user(&stream, Action::message_text("do the thing")).await;
    agent(&stream, Action::read("thing.txt")).await;

    assert_eq!(memory.last_user_message(), "do the thing");
    assert_eq!(memory.last_agent_message(), "hello");
}

// --- Delegates and reset ---

#[tokio::test]
async fn delegate_interior_is_out_of_view() {
    let (stream, memory) = open().await;
    user(&stream, Action::message_text("summarize")).await; // 0
    agent(&stream, Action::delegate("reader", "read everything")).await; // 1
    agent(&stream, Action::message_text("inner chatter")).await; // 2
    agent(&stream, Action::read("doc.txt")).await; // 3
    agent(&stream, Observation::delegate_done("read it")).await; // 4
    agent(&stream, Action::finish()).await; // 5

    assert_eq!(memory.last_agent_message(), "");
    assert_eq!(id(memory.last_action(None)), Some(1));

    let visible: Vec<u64> = memory
        .events(false, false)
        .iter()
        .map(|event| event.id.get())
        .collect();
    assert_eq!(visible, vec![0, 1, 4, 5]);
    assert_eq!(memory.events(false, true).len(), 6);

    let reversed: Vec<u64> = memory
        .events(true, false)
        .iter()
        .map(|event| event.id.get())
        .collect();
    assert_eq!(reversed, vec![5, 4, 1, 0]);
}

#[tokio::test]
async fn reset_hides_earlier_conversation() {
    let (stream, memory) = open().await;
    user(&stream, Action::message_text("old task")).await; // 0
    agent(&stream, Action::message_text("old reply")).await; // 1
    agent(&stream, Action::read("x")).await; // 2
    stream.reset().await;
    user(&stream, Action::message_text("new task")).await; // 3

    assert_eq!(
        memory.current_user_intent().map(|intent| intent.text),
        Some("new task".into())
    );
    assert_eq!(memory.last_agent_message(), "");
    assert_eq!(
        memory
            .events(false, false)
            .iter()
            .map(|event| event.id.get())
            .collect::<Vec<_>>(),
        vec![2, 3]
    );
}

// --- Last events ---

#[tokio::test]
async fn last_events_window() {
    let (stream, memory) = open().await;
    for n in 0..5 {
        agent(&stream, Action::read(format!("{n}.txt"))).await;
    }
    let ids = |events: Vec<Arc<tether_types::Event>>| {
        events.iter().map(|event| event.id.get()).collect::<Vec<_>>()
    };
    assert_eq!(ids(memory.last_events(2)), vec![3, 4]);
    assert_eq!(ids(memory.last_events(50)), vec![0, 1, 2, 3, 4]);
    assert!(memory.last_events(0).is_empty());

    stream.reset().await;
    assert_eq!(ids(memory.last_events(50)), vec![4]);
}

#[tokio::test]
async fn last_events_counts_hidden_ids() {
    let (stream, memory) = open().await;
    agent(&stream, Action::read("a")).await; // 0
    agent(&stream, Action::read("b")).await; // 1
    agent(&stream, Observation::null("")).await; // 2
    let ids: Vec<u64> = memory
        .last_events(2)
        .iter()
        .map(|event| event.id.get())
        .collect();
    assert_eq!(ids, vec![1]);
}

use serde_json::json;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use tether_store_fs::FsStore;
use tether_store_memory::MemoryStore;
use tether_stream::{EventQuery, EventStream, StreamConfig};
use tether_types::test_utils::{FlakyStore, RecordingSubscriber};
use tether_types::{
    Action, EventDraft, EventId, EventSource, Observation, RecordStore, StreamError,
};

fn memory() -> Arc<dyn RecordStore> {
    Arc::new(MemoryStore::new())
}

fn ids(stream: &EventStream, query: &EventQuery) -> Vec<u64> {
    stream.events(query).map(|event| event.id.get()).collect()
}

// --- Append ---

#[tokio::test]
async fn ids_are_dense_from_zero() {
    let stream = EventStream::open("abc", memory()).await.unwrap();
    assert_eq!(stream.latest_id(), None);
    assert!(stream.is_empty());

    for expected in 0..5 {
        let event = stream
            .append(Action::read("a.txt"), EventSource::Agent)
            .await
            .unwrap();
        assert_eq!(event.id, EventId::new(expected));
    }
    assert_eq!(stream.latest_id(), Some(EventId::new(4)));
    assert_eq!(stream.len(), 5);
}

#[tokio::test]
async fn null_then_message_traversal() {
    let stream = EventStream::open("abc", memory()).await.unwrap();
    stream
        .append(Observation::null("first"), EventSource::Agent)
        .await
        .unwrap();
    let all = EventQuery::default().show_all();
    assert_eq!(stream.events(&all).count(), 1);

    stream
        .append(Observation::null("second"), EventSource::Agent)
        .await
        .unwrap();
    let contents: Vec<String> = stream
        .events(&all)
        .filter_map(|event| event.as_observation().map(|o| o.content().to_owned()))
        .collect();
    assert_eq!(contents, vec!["first", "second"]);
}

#[tokio::test]
async fn append_returns_source_and_extras() {
    let stream = EventStream::open("abc", memory()).await.unwrap();
    let event = stream
        .append(
            EventDraft::new(Action::message_text("hi")).with_extra("channel", "cli"),
            EventSource::User,
        )
        .await
        .unwrap();
    assert_eq!(event.source, EventSource::User);
    assert_eq!(event.extras.get("channel"), Some(&json!("cli")));
    assert_eq!(stream.get(EventId::ZERO).as_deref(), Some(event.as_ref()));
}

#[tokio::test]
async fn concurrent_appends_get_distinct_ids() {
    let stream = Arc::new(EventStream::open("abc", memory()).await.unwrap());
    let mut tasks = Vec::new();
    for n in 0..20 {
        let stream = Arc::clone(&stream);
        tasks.push(tokio::spawn(async move {
            stream
                .append(Action::read(format!("{n}.txt")), EventSource::Agent)
                .await
                .unwrap()
                .id
        }));
    }
    let mut seen = Vec::new();
    for task in tasks {
        seen.push(task.await.unwrap().get());
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..20).collect::<Vec<_>>());
    assert_eq!(
        ids(&stream, &EventQuery::default()),
        (0..20).collect::<Vec<_>>()
    );
}

// --- Persistence ---

#[tokio::test]
async fn record_layout_in_store() {
    let store = memory();
    let stream = EventStream::open("abc", Arc::clone(&store)).await.unwrap();
    stream
        .append(Observation::null(""), EventSource::Agent)
        .await
        .unwrap();

    let bytes = store
        .read("sessions/abc/events/0.json")
        .await
        .unwrap()
        .expect("record written");
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(value["timestamp"].is_string());
    value.as_object_mut().unwrap().remove("timestamp");
    assert_eq!(
        value,
        json!({
            "id": 0,
            "source": "agent",
            "observation": "null",
            "content": "",
            "extras": {},
            "message": "No observation",
        })
    );
}

#[tokio::test]
async fn custom_key_prefix() {
    let store = memory();
    let config = StreamConfig::default().with_key_prefix("agents");
    let stream = EventStream::open_with_config("abc", Arc::clone(&store), config)
        .await
        .unwrap();
    stream
        .append(Action::read("a"), EventSource::Agent)
        .await
        .unwrap();
    assert_eq!(
        store.list("agents/").await.unwrap(),
        vec!["agents/abc/events/0.json"]
    );
    assert!(store.list("sessions/").await.unwrap().is_empty());
}

#[tokio::test]
async fn reopen_reproduces_sequence() {
    let store = memory();
    let original = {
        let stream = EventStream::open("abc", Arc::clone(&store)).await.unwrap();
        stream
            .append(Action::message_text("hello"), EventSource::User)
            .await
            .unwrap();
        stream
            .append(Action::read("a.txt"), EventSource::Agent)
            .await
            .unwrap();
        stream
            .append(Observation::null(""), EventSource::Agent)
            .await
            .unwrap();
        stream
            .events(&EventQuery::default().show_all())
            .collect::<Vec<_>>()
    };

    let reopened = EventStream::open("abc", store).await.unwrap();
    let rehydrated: Vec<_> = reopened.events(&EventQuery::default().show_all()).collect();
    assert_eq!(rehydrated, original);

    let next = reopened
        .append(Action::finish(), EventSource::Agent)
        .await
        .unwrap();
    assert_eq!(next.id, EventId::new(3));
}

#[tokio::test]
async fn reopen_from_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    {
        let stream = EventStream::open("abc", Arc::new(FsStore::new(dir.path())))
            .await
            .unwrap();
        for n in 0..12 {
            stream
                .append(Action::read(format!("{n}.txt")), EventSource::Agent)
                .await
                .unwrap();
        }
    }
    let stream = EventStream::open("abc", Arc::new(FsStore::new(dir.path())))
        .await
        .unwrap();
    assert_eq!(stream.latest_id(), Some(EventId::new(11)));
    // Numeric, not lexicographic, order.
    assert_eq!(
        ids(&stream, &EventQuery::default()),
        (0..12).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn streams_are_isolated_by_id() {
    let store = memory();
    let first = EventStream::open("abc", Arc::clone(&store)).await.unwrap();
    first
        .append(Action::read("a"), EventSource::Agent)
        .await
        .unwrap();

    let second = EventStream::open("abcd", store).await.unwrap();
    assert_eq!(second.latest_id(), None);
}

// --- Failure paths ---

#[tokio::test]
async fn failed_write_leaves_no_trace() {
    let flaky = Arc::new(FlakyStore::new(memory()));
    let stream = EventStream::open("abc", flaky.clone()).await.unwrap();
    let recorder = Arc::new(RecordingSubscriber::new());
    stream.subscribe("recorder", recorder.clone());

    stream
        .append(Action::read("a"), EventSource::Agent)
        .await
        .unwrap();
    flaky.fail_next_writes(1);
    let result = stream.append(Action::read("b"), EventSource::Agent).await;
    assert!(matches!(result, Err(StreamError::Storage(_))));
    assert_eq!(stream.latest_id(), Some(EventId::new(0)));
    assert!(stream.get(EventId::new(1)).is_none());

    let retried = stream
        .append(Action::read("c"), EventSource::Agent)
        .await
        .unwrap();
    assert_eq!(retried.id, EventId::new(1));

    stream.flush().await;
    assert_eq!(recorder.ids(), vec![EventId::new(0), EventId::new(1)]);
    assert_eq!(recorder.events()[1].message(), "Reading file: c");
}

#[tokio::test]
async fn unreachable_store_fails_open() {
    let flaky = Arc::new(FlakyStore::new(memory()));
    flaky.set_unreachable(true);
    let result = EventStream::open("abc", flaky).await;
    assert!(matches!(result, Err(StreamError::Storage(_))));
}

#[tokio::test]
async fn corrupt_record_fails_open() {
    let store = memory();
    store
        .write("sessions/abc/events/0.json", b"not json".to_vec())
        .await
        .unwrap();
    let result = EventStream::open("abc", store).await;
    assert!(matches!(result, Err(StreamError::CorruptRecord { .. })));
}

#[tokio::test]
async fn gap_in_ids_fails_open() {
    let store = memory();
    {
        let stream = EventStream::open("abc", Arc::clone(&store)).await.unwrap();
        stream
            .append(Action::read("a"), EventSource::Agent)
            .await
            .unwrap();
    }
    let record = store.read("sessions/abc/events/0.json").await.unwrap().unwrap();
    let mut value: serde_json::Value = serde_json::from_slice(&record).unwrap();
    value["id"] = json!(2);
    store
        .write(
            "sessions/abc/events/2.json",
            serde_json::to_vec(&value).unwrap(),
        )
        .await
        .unwrap();

    match EventStream::open("abc", store).await {
        Err(StreamError::NonContiguous { expected, found }) => {
            assert_eq!(expected, EventId::new(1));
            assert_eq!(found, EventId::new(2));
        }
        other => panic!("expected NonContiguous, got {other:?}"),
    }
}

#[tokio::test]
async fn record_id_must_match_key() {
    let store = memory();
    {
        let stream = EventStream::open("abc", Arc::clone(&store)).await.unwrap();
        stream
            .append(Action::read("a"), EventSource::Agent)
            .await
            .unwrap();
        stream
            .append(Action::read("b"), EventSource::Agent)
            .await
            .unwrap();
    }
    let record = store.read("sessions/abc/events/0.json").await.unwrap().unwrap();
    store
        .write("sessions/abc/events/1.json", record)
        .await
        .unwrap();

    let result = EventStream::open("abc", store).await;
    assert!(matches!(result, Err(StreamError::IdMismatch { .. })));
}

#[tokio::test]
async fn stray_keys_are_skipped() {
    let store = memory();
    {
        let stream = EventStream::open("abc", Arc::clone(&store)).await.unwrap();
        stream
            .append(Action::read("a"), EventSource::Agent)
            .await
            .unwrap();
    }
    store
        .write("sessions/abc/events/notes.txt", b"scratch".to_vec())
        .await
        .unwrap();
    store
        .write("sessions/abc/events/01.json", b"{}".to_vec())
        .await
        .unwrap();

    let stream = EventStream::open("abc", store).await.unwrap();
    assert_eq!(stream.latest_id(), Some(EventId::ZERO));
}

#[tokio::test]
async fn invalid_stream_id_is_rejected() {
    for id in ["", "a/b", ".."] {
        let result = EventStream::open(id, memory()).await;
        assert!(
            matches!(result, Err(StreamError::InvalidStreamId(_))),
            "{id:?} should be rejected"
        );
    }
}

#[test]
fn open_outside_a_runtime_is_an_error() {
    let mut open = std::pin::pin!(EventStream::open("abc", memory()));
    let mut cx = Context::from_waker(Waker::noop());
    match open.as_mut().poll(&mut cx) {
        Poll::Ready(Err(StreamError::NoRuntime)) => {}
        other => panic!("expected NoRuntime, got {other:?}"),
    }
}

// --- Reset ---

#[tokio::test]
async fn reset_moves_start_offset_and_keeps_events() {
    let stream = EventStream::open("abc", memory()).await.unwrap();
    assert_eq!(stream.start_offset(), EventId::ZERO);
    stream.reset().await;
    assert_eq!(stream.start_offset(), EventId::ZERO);

    for _ in 0..3 {
        stream
            .append(Action::read("a"), EventSource::Agent)
            .await
            .unwrap();
    }
    stream.reset().await;
    assert_eq!(stream.start_offset(), EventId::new(2));
    assert_eq!(stream.len(), 3);
    assert_eq!(ids(&stream, &EventQuery::default()), vec![0, 1, 2]);
}

#[tokio::test]
async fn reader_sees_later_appends() {
    let stream = EventStream::open("abc", memory()).await.unwrap();
    let reader = stream.reader();
    assert!(reader.is_empty());
    stream
        .append(Action::read("a"), EventSource::Agent)
        .await
        .unwrap();
    assert_eq!(reader.latest_id(), Some(EventId::ZERO));
    assert_eq!(reader.len(), 1);
}

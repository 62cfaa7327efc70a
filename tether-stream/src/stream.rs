//! EventStream: the append-only log for one stream id.

use crate::config::StreamConfig;
use crate::delegate::{DelegateRange, DelegateTracker, RangeTable};
use crate::keys;
use crate::log::EventLog;
use crate::query::{EventQuery, EventReader, Events};
use crate::registry::{SubscribeOptions, SubscriberRegistry};
use chrono::Utc;
use std::sync::Arc;
use tether_types::{
    Event, EventDraft, EventId, EventSource, RecordStore, StoreError, StreamError, StreamId,
    Subscriber, SubscriberId,
};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Append-only, persisted, observable event log for one stream id.
///
/// Appends are serialized: each one assigns the next id, writes the record
/// to the store, makes the event visible to readers, updates the delegate
/// ranges, and then notifies subscribers in registration order. A failed
/// write leaves no trace. Once the write succeeds, every subscriber gets
/// the event even if the caller stops polling `append`.
///
/// Two `EventStream`s opened on the same id see the same persisted events
/// but keep their own subscribers, delegate ranges, and start offset.
pub struct EventStream {
    id: StreamId,
    config: StreamConfig,
    store: Arc<dyn RecordStore>,
    events_prefix: String,
    log: Arc<EventLog>,
    ranges: RangeTable,
    tracker: DelegateTracker,
    registry: Arc<SubscriberRegistry>,
    runtime: Handle,
    append_gate: Arc<Mutex<()>>,
}

impl EventStream {
    /// Open the stream `id` with the default configuration.
    ///
    /// See [`EventStream::open_with_config`].
    pub async fn open(
        id: impl Into<StreamId>,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, StreamError> {
        Self::open_with_config(id, store, StreamConfig::default()).await
    }

    /// Open the stream `id`, rehydrating whatever the store already holds.
    ///
    /// A stream with no records opens empty. Keys under the stream's prefix
    /// that are not event records are skipped. Records must decode, carry
    /// the id named by their key, and cover every id from 0 upwards.
    ///
    /// Queued subscribers are drained on the tokio runtime `open` is
    /// polled from. Outside a runtime it fails with
    /// [`StreamError::NoRuntime`].
    pub async fn open_with_config(
        id: impl Into<StreamId>,
        store: Arc<dyn RecordStore>,
        config: StreamConfig,
    ) -> Result<Self, StreamError> {
        let id = id.into();
        let runtime = Handle::try_current().map_err(|_| StreamError::NoRuntime)?;
        if !keys::valid_stream_id(&id) {
            return Err(StreamError::InvalidStreamId(id.0));
        }
        let events_prefix = keys::events_prefix(&config.key_prefix, &id);
        let events = rehydrate(store.as_ref(), &events_prefix).await?;

        let log = Arc::new(EventLog::new(events));
        let ranges = RangeTable::default();
        let reader = EventReader::new(Arc::clone(&log), ranges.clone());
        let tracker = DelegateTracker::new(reader, ranges.clone());
        for index in 0..log.len() as u64 {
            if let Some(event) = log.get(EventId::new(index)) {
                tracker.observe(&event);
            }
        }

        let registry = Arc::new(SubscriberRegistry::new(&config, runtime.clone()));

        debug!(stream = %id, events = log.len(), "event stream opened");
        Ok(Self {
            id,
            config,
            store,
            events_prefix,
            log,
            ranges,
            tracker,
            registry,
            runtime,
            append_gate: Arc::new(Mutex::new(())),
        })
    }

    /// The stream id.
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// The configuration the stream was opened with.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Append an event and return it with its id and timestamp filled in.
    ///
    /// Returns only after the record is durable and every inline
    /// subscriber has run. Queued subscribers have been handed the event
    /// but may not have processed it yet.
    ///
    /// Notification runs on its own task that holds the append gate, so
    /// dropping this future after the write neither skips a subscriber nor
    /// lets the next append overtake it.
    pub async fn append(
        &self,
        draft: impl Into<EventDraft>,
        source: EventSource,
    ) -> Result<Arc<Event>, StreamError> {
        let gate = Arc::clone(&self.append_gate).lock_owned().await;

        let id = self.log.next_id();
        let event = draft.into().finalize(id, source, Utc::now());
        let bytes =
            serde_json::to_vec(&event).map_err(|source| StreamError::Encode { id, source })?;
        self.store
            .write(&keys::event_key(&self.events_prefix, id), bytes)
            .await?;

        let event = Arc::new(event);
        self.log.push(Arc::clone(&event));
        self.tracker.observe(&event);
        debug!(stream = %self.id, event_id = %id, kind = %event.kind(), "event appended");

        let registry = Arc::clone(&self.registry);
        let notified = Arc::clone(&event);
        let notification = self.runtime.spawn(async move {
            let _gate = gate;
            registry.notify(&notified).await;
        });
        if let Err(error) = notification.await {
            warn!(
                stream = %self.id,
                event_id = %id,
                error = %error,
                "subscriber notification aborted"
            );
        }
        Ok(event)
    }

    /// Highest assigned id, or `None` for an empty stream.
    pub fn latest_id(&self) -> Option<EventId> {
        self.log.latest_id()
    }

    /// Number of events in the stream.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether the stream holds no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The event with `id`.
    pub fn get(&self, id: EventId) -> Option<Arc<Event>> {
        self.log.get(id)
    }

    /// Traverse the stream. See [`EventQuery`] for the filters.
    pub fn events(&self, query: &EventQuery) -> Events {
        self.reader().events(query)
    }

    /// A cloneable read handle that outlives borrows of the stream.
    pub fn reader(&self) -> EventReader {
        EventReader::new(Arc::clone(&self.log), self.ranges.clone())
    }

    /// Register `subscriber` under `name` at the end of the notification
    /// order, delivered through its own queue. Registering a name again
    /// replaces the earlier subscriber.
    pub fn subscribe(&self, name: impl Into<SubscriberId>, subscriber: Arc<dyn Subscriber>) {
        self.subscribe_with(name, subscriber, SubscribeOptions::default());
    }

    /// Register `subscriber` with explicit position and delivery.
    pub fn subscribe_with(
        &self,
        name: impl Into<SubscriberId>,
        subscriber: Arc<dyn Subscriber>,
        options: SubscribeOptions,
    ) {
        self.registry.register(name.into(), subscriber, options);
    }

    /// Remove the subscriber named `name`. A queued subscriber still
    /// handles what it was already sent. Returns whether one was removed.
    pub fn unsubscribe(&self, name: impl Into<SubscriberId>) -> bool {
        self.registry.unregister(&name.into())
    }

    /// Names of the registered subscribers in notification order.
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        self.registry.names()
    }

    /// Wait until every queued subscriber has handled every event appended
    /// before this call.
    pub async fn flush(&self) {
        self.registry.flush().await;
    }

    /// Forget all delegate ranges and move the start offset to the latest
    /// id. Persisted events are untouched.
    pub async fn reset(&self) {
        let _gate = self.append_gate.lock().await;
        self.ranges.clear();
        let offset = self.log.latest_id().unwrap_or(EventId::ZERO);
        self.log.set_start_offset(offset);
        debug!(stream = %self.id, start_offset = %offset, "event stream reset");
    }

    /// Lowest id visible to offset-bounded queries.
    pub fn start_offset(&self) -> EventId {
        self.log.start_offset()
    }

    /// Snapshot of the recorded delegate ranges, oldest first.
    pub fn delegates(&self) -> Vec<DelegateRange> {
        self.ranges.snapshot()
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("id", &self.id)
            .field("len", &self.len())
            .field("start_offset", &self.start_offset())
            .finish()
    }
}

async fn rehydrate(
    store: &dyn RecordStore,
    events_prefix: &str,
) -> Result<Vec<Arc<Event>>, StreamError> {
    let mut keyed = Vec::new();
    for key in store.list(events_prefix).await? {
        match keys::parse_event_key(events_prefix, &key) {
            Some(id) => keyed.push((id, key)),
            None => warn!(key = %key, "skipping key that is not an event record"),
        }
    }
    keyed.sort_by_key(|(id, _)| *id);

    let mut events = Vec::with_capacity(keyed.len());
    let mut expected = EventId::ZERO;
    for (id, key) in keyed {
        if id != expected {
            return Err(StreamError::NonContiguous { expected, found: id });
        }
        let bytes = store.read(&key).await?.ok_or_else(|| StoreError::ReadFailed {
            key: key.clone(),
            message: "listed record is missing".into(),
        })?;
        let event: Event = serde_json::from_slice(&bytes).map_err(|source| {
            StreamError::CorruptRecord {
                key: key.clone(),
                source,
            }
        })?;
        if event.id != id {
            return Err(StreamError::IdMismatch {
                key,
                found: event.id,
            });
        }
        events.push(Arc::new(event));
        expected = expected.next();
    }
    Ok(events)
}

//! The event record and its wire format.

use crate::action::Action;
use crate::id::EventId;
use crate::kind::EventKind;
use crate::observation::Observation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// The human driving the agent.
    User,
    /// The agent or its runtime.
    Agent,
}

/// What an event records: an action or an observation.
///
/// Untagged on the wire: the presence of an `action` or `observation` key
/// decides which side a record belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// An intent to act.
    Action(Action),
    /// A result or ambient change.
    Observation(Observation),
}

impl EventPayload {
    /// The variant's kind.
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Action(action) => EventKind::Action(action.kind()),
            EventPayload::Observation(observation) => {
                EventKind::Observation(observation.kind())
            }
        }
    }

    /// One-line human-readable summary.
    pub fn message(&self) -> String {
        match self {
            EventPayload::Action(action) => action.message(),
            EventPayload::Observation(observation) => observation.message(),
        }
    }
}

impl From<Action> for EventPayload {
    fn from(action: Action) -> Self {
        EventPayload::Action(action)
    }
}

impl From<Observation> for EventPayload {
    fn from(observation: Observation) -> Self {
        EventPayload::Observation(observation)
    }
}

/// An event as a producer submits it, before the log assigns an id and
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// What the event records.
    pub payload: EventPayload,
    /// Auxiliary key/value pairs.
    pub extras: Map<String, Value>,
}

impl EventDraft {
    /// A draft with no extras.
    pub fn new(payload: impl Into<EventPayload>) -> Self {
        Self {
            payload: payload.into(),
            extras: Map::new(),
        }
    }

    /// Attach an auxiliary key/value pair.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Stamp the draft into a finished event. Only the log should call
    /// this; ids are never chosen by producers.
    pub fn finalize(self, id: EventId, source: EventSource, timestamp: DateTime<Utc>) -> Event {
        Event {
            id,
            timestamp,
            source,
            payload: self.payload,
            extras: self.extras,
        }
    }
}

impl From<Action> for EventDraft {
    fn from(action: Action) -> Self {
        EventDraft::new(action)
    }
}

impl From<Observation> for EventDraft {
    fn from(observation: Observation) -> Self {
        EventDraft::new(observation)
    }
}

impl From<EventPayload> for EventDraft {
    fn from(payload: EventPayload) -> Self {
        EventDraft::new(payload)
    }
}

/// One immutable entry in an event stream.
///
/// Created by the log at append time and shared as `Arc<Event>` from then
/// on. Serializes to the flat record described in the crate docs.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EventRecord", from = "EventRecord")]
pub struct Event {
    /// Position in the stream.
    pub id: EventId,
    /// Wall-clock time of append.
    pub timestamp: DateTime<Utc>,
    /// Who produced the event.
    pub source: EventSource,
    /// What the event records.
    pub payload: EventPayload,
    /// Auxiliary key/value pairs.
    pub extras: Map<String, Value>,
}

impl Event {
    /// The variant's kind.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// One-line human-readable summary.
    pub fn message(&self) -> String {
        self.payload.message()
    }

    /// The action, if this event is one.
    pub fn as_action(&self) -> Option<&Action> {
        match &self.payload {
            EventPayload::Action(action) => Some(action),
            EventPayload::Observation(_) => None,
        }
    }

    /// The observation, if this event is one.
    pub fn as_observation(&self) -> Option<&Observation> {
        match &self.payload {
            EventPayload::Observation(observation) => Some(observation),
            EventPayload::Action(_) => None,
        }
    }
}

/// On-disk shape of an [`Event`].
#[derive(Serialize, Deserialize)]
struct EventRecord {
    id: EventId,
    timestamp: DateTime<Utc>,
    source: EventSource,
    #[serde(flatten)]
    payload: EventPayload,
    #[serde(default)]
    extras: Map<String, Value>,
    // Derived from the payload; whatever was stored is ignored on read.
    #[serde(default)]
    message: String,
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        let message = event.payload.message();
        Self {
            id: event.id,
            timestamp: event.timestamp,
            source: event.source,
            payload: event.payload,
            extras: event.extras,
            message,
        }
    }
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        Self {
            id: record.id,
            timestamp: record.timestamp,
            source: record.source,
            payload: record.payload,
            extras: record.extras,
        }
    }
}

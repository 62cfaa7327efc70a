//! Record key layout.

use tether_types::{EventId, StreamId};

/// Prefix shared by every record of one stream, trailing slash included.
pub(crate) fn events_prefix(key_prefix: &str, stream: &StreamId) -> String {
    format!("{key_prefix}/{stream}/events/")
}

pub(crate) fn event_key(events_prefix: &str, id: EventId) -> String {
    format!("{events_prefix}{id}.json")
}

/// Recover the id from a record key. Only canonical keys parse: no
/// leading zeros, no signs, no nested segments.
pub(crate) fn parse_event_key(events_prefix: &str, key: &str) -> Option<EventId> {
    let stem = key.strip_prefix(events_prefix)?.strip_suffix(".json")?;
    let id: u64 = stem.parse().ok()?;
    (id.to_string() == stem).then_some(EventId::new(id))
}

/// A stream id must be usable as exactly one key segment.
pub(crate) fn valid_stream_id(stream: &StreamId) -> bool {
    let id = stream.as_str();
    !id.is_empty() && id != "." && id != ".." && !id.contains('/')
}

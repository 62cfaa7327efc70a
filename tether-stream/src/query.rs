//! Filtered traversal over a stream's committed events.

use crate::delegate::{DelegateRange, RangeTable};
use crate::log::EventLog;
use std::collections::HashSet;
use std::iter::FusedIterator;
use std::sync::Arc;
use tether_types::{Event, EventId, EventKind};

/// What to traverse and what to leave out.
///
/// The default query walks the whole stream forward, hides the null and
/// agent-state kinds, and skips everything strictly inside a delegate
/// range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Lowest id to consider, inclusive. `None` means 0.
    pub start_id: Option<EventId>,
    /// Highest id to consider, inclusive. `None` means the latest id at
    /// the time the iterator is created.
    pub end_id: Option<EventId>,
    /// Emit newest first.
    pub reverse: bool,
    /// Keep events that sit inside a delegate range.
    pub include_delegates: bool,
    /// Kinds that are never emitted.
    pub hidden_kinds: HashSet<EventKind>,
}

impl EventQuery {
    /// Start at `id`, inclusive.
    pub fn start(mut self, id: impl Into<EventId>) -> Self {
        self.start_id = Some(id.into());
        self
    }

    /// Stop at `id`, inclusive.
    pub fn end(mut self, id: impl Into<EventId>) -> Self {
        self.end_id = Some(id.into());
        self
    }

    /// Emit newest first.
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Keep events inside delegate ranges.
    pub fn include_delegates(mut self) -> Self {
        self.include_delegates = true;
        self
    }

    /// Also hide `kind`.
    pub fn hide(mut self, kind: impl Into<EventKind>) -> Self {
        self.hidden_kinds.insert(kind.into());
        self
    }

    /// Hide nothing.
    pub fn show_all(mut self) -> Self {
        self.hidden_kinds.clear();
        self
    }
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            start_id: None,
            end_id: None,
            reverse: false,
            include_delegates: false,
            hidden_kinds: EventKind::DEFAULT_HIDDEN.into_iter().collect(),
        }
    }
}

/// Cloneable read-only handle onto a stream.
///
/// Readers never touch the record store: everything they return is
/// already durable and in memory.
#[derive(Clone)]
pub struct EventReader {
    log: Arc<EventLog>,
    ranges: RangeTable,
}

impl EventReader {
    pub(crate) fn new(log: Arc<EventLog>, ranges: RangeTable) -> Self {
        Self { log, ranges }
    }

    /// Traverse the committed events matching `query`.
    ///
    /// The upper bound is fixed when this is called. Events appended
    /// afterwards are not seen by the returned iterator.
    pub fn events(&self, query: &EventQuery) -> Events {
        let front = query.start_id.map_or(0, EventId::get);
        let back = match (self.log.latest_id(), query.end_id) {
            (None, _) => 0,
            (Some(latest), None) => latest.get() + 1,
            (Some(latest), Some(end)) => latest.min(end).get() + 1,
        };
        let ranges = if query.include_delegates {
            Vec::new()
        } else {
            self.ranges.snapshot()
        };
        Events {
            log: Arc::clone(&self.log),
            front,
            back: back.max(front),
            reverse: query.reverse,
            hidden_kinds: query.hidden_kinds.clone(),
            ranges,
        }
    }

    /// The event with `id`, if it has been committed.
    pub fn get(&self, id: EventId) -> Option<Arc<Event>> {
        self.log.get(id)
    }

    /// Highest committed id, or `None` for an empty stream.
    pub fn latest_id(&self) -> Option<EventId> {
        self.log.latest_id()
    }

    /// Lowest id visible to offset-bounded queries.
    pub fn start_offset(&self) -> EventId {
        self.log.start_offset()
    }

    /// Number of committed events.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the recorded delegate ranges, oldest first.
    pub fn delegates(&self) -> Vec<DelegateRange> {
        self.ranges.snapshot()
    }
}

impl std::fmt::Debug for EventReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReader")
            .field("len", &self.len())
            .field("start_offset", &self.start_offset())
            .finish()
    }
}

/// Lazy iterator returned by [`EventReader::events`].
///
/// Walks the id window `[front, back)` from whichever end the query asked
/// for, fetching one event at a time. Iterating from the other end with
/// `next_back` yields the opposite order.
pub struct Events {
    log: Arc<EventLog>,
    front: u64,
    back: u64,
    reverse: bool,
    hidden_kinds: HashSet<EventKind>,
    ranges: Vec<DelegateRange>,
}

impl Events {
    fn admits(&self, event: &Event) -> bool {
        if self.hidden_kinds.contains(&event.kind()) {
            return false;
        }
        !self.ranges.iter().any(|range| range.contains_strictly(event.id))
    }

    fn pop_front(&mut self) -> Option<Arc<Event>> {
        while self.front < self.back {
            let id = EventId::new(self.front);
            self.front += 1;
            match self.log.get(id) {
                Some(event) if self.admits(&event) => return Some(event),
                Some(_) => {}
                None => break,
            }
        }
        None
    }

    fn pop_back(&mut self) -> Option<Arc<Event>> {
        while self.front < self.back {
            self.back -= 1;
            match self.log.get(EventId::new(self.back)) {
                Some(event) if self.admits(&event) => return Some(event),
                Some(_) => {}
                None => break,
            }
        }
        None
    }
}

impl Iterator for Events {
    type Item = Arc<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reverse {
            self.pop_back()
        } else {
            self.pop_front()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.back - self.front).ok();
        (0, remaining)
    }
}

impl DoubleEndedIterator for Events {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.reverse {
            self.pop_front()
        } else {
            self.pop_back()
        }
    }
}

impl FusedIterator for Events {}

//! The in-memory sequence behind a stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tether_types::{Event, EventId};

/// Committed events, indexed by id.
///
/// Ids are dense from zero, so an event's id is also its index. The vec
/// only ever grows, and an event is pushed only once its record is
/// durable, so any reader sees a prefix of the final sequence.
pub(crate) struct EventLog {
    events: RwLock<Vec<Arc<Event>>>,
    start_offset: AtomicU64,
}

impl EventLog {
    pub(crate) fn new(events: Vec<Arc<Event>>) -> Self {
        Self {
            events: RwLock::new(events),
            start_offset: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Event>>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    pub(crate) fn next_id(&self) -> EventId {
        EventId::new(self.len() as u64)
    }

    pub(crate) fn latest_id(&self) -> Option<EventId> {
        self.next_id().prev()
    }

    pub(crate) fn get(&self, id: EventId) -> Option<Arc<Event>> {
        let index = usize::try_from(id.get()).ok()?;
        self.read().get(index).cloned()
    }

    pub(crate) fn push(&self, event: Arc<Event>) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        debug_assert_eq!(event.id.get(), events.len() as u64);
        events.push(event);
    }

    pub(crate) fn start_offset(&self) -> EventId {
        EventId::new(self.start_offset.load(Ordering::Acquire))
    }

    pub(crate) fn set_start_offset(&self, offset: EventId) {
        self.start_offset.store(offset.get(), Ordering::Release);
    }
}

//! Delegate range tracking.
//!
//! A delegate range brackets the events a sub-agent produced while working
//! on a delegated task: it opens at the `delegate` action and closes at the
//! `delegate` observation that reports completion. Ranges are discovered
//! when the closing observation arrives. The stream feeds every event to
//! the tracker before any subscriber sees it, so the table is current as
//! soon as `append` returns.

use crate::query::{EventQuery, EventReader};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tether_types::{Action, Event, EventId, Observation};
use tracing::{debug, error};

/// Closed id interval `[start_id, end_id]` covering one delegated task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateRange {
    /// Id of the `delegate` action that handed the task off.
    pub start_id: EventId,
    /// Id of the `delegate` observation that reported completion.
    pub end_id: EventId,
    /// Name of the agent that took the task.
    pub agent: String,
    /// The task description, empty if the action carried none.
    pub task: String,
}

impl DelegateRange {
    /// Whether `id` lies inside the range, boundaries excluded.
    pub fn contains_strictly(&self, id: EventId) -> bool {
        self.start_id < id && id < self.end_id
    }
}

/// Range table shared between the tracker and every reader of a stream.
#[derive(Clone, Default)]
pub(crate) struct RangeTable(Arc<RwLock<Vec<DelegateRange>>>);

impl RangeTable {
    pub(crate) fn snapshot(&self) -> Vec<DelegateRange> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(&self, range: DelegateRange) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(range);
    }

    pub(crate) fn clear(&self) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Records a [`DelegateRange`] for every completed delegation.
///
/// Owned by the stream rather than the subscriber registry, so no
/// subscriber name can replace or remove it.
///
/// Nested delegation is not tracked as such: a completion pairs with the
/// nearest preceding `delegate` action at or above the start offset.
pub(crate) struct DelegateTracker {
    reader: EventReader,
    ranges: RangeTable,
}

impl DelegateTracker {
    pub(crate) fn new(reader: EventReader, ranges: RangeTable) -> Self {
        Self { reader, ranges }
    }

    /// Record a range if `event` closes one.
    pub(crate) fn observe(&self, event: &Event) {
        if !matches!(event.as_observation(), Some(Observation::Delegate { .. })) {
            return;
        }
        match self.find_opening(event.id) {
            Some(range) => {
                debug!(
                    start_id = %range.start_id,
                    end_id = %range.end_id,
                    agent = %range.agent,
                    "delegate range recorded"
                );
                self.ranges.push(range);
            }
            None => error!(
                event_id = %event.id,
                start_offset = %self.reader.start_offset(),
                "delegate completed with no matching delegate action"
            ),
        }
    }

    fn find_opening(&self, end_id: EventId) -> Option<DelegateRange> {
        let before = end_id.prev()?;
        let start_offset = self.reader.start_offset();
        if before < start_offset {
            return None;
        }
        let query = EventQuery::default()
            .start(start_offset)
            .end(before)
            .reverse()
            .include_delegates()
            .show_all();
        self.reader.events(&query).find_map(|event| match event.as_action() {
            Some(Action::Delegate { agent, inputs, .. }) => Some(DelegateRange {
                start_id: event.id,
                end_id,
                agent: agent.clone(),
                task: match inputs.get("task") {
                    Some(Value::String(task)) => task.clone(),
                    _ => String::new(),
                },
            }),
            _ => None,
        })
    }
}

//! Variant names used to filter traversals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the [`Action`](crate::Action) variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Read a file.
    Read,
    /// Write a file.
    Write,
    /// Send a chat message.
    Message,
    /// Hand a sub-task to another agent.
    Delegate,
    /// Request an agent state transition.
    ChangeAgentState,
    /// Declare the task finished.
    Finish,
    /// Do nothing.
    Null,
}

impl ActionKind {
    /// The wire name written under the `action` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Read => "read",
            ActionKind::Write => "write",
            ActionKind::Message => "message",
            ActionKind::Delegate => "delegate",
            ActionKind::ChangeAgentState => "change_agent_state",
            ActionKind::Finish => "finish",
            ActionKind::Null => "null",
        }
    }
}

/// Names of the [`Observation`](crate::Observation) variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// File content that was read.
    Read,
    /// Confirmation of a file write.
    Write,
    /// A delegated sub-task completed.
    Delegate,
    /// The agent state changed.
    AgentStateChanged,
    /// Nothing was observed.
    Null,
}

impl ObservationKind {
    /// The wire name written under the `observation` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationKind::Read => "read",
            ObservationKind::Write => "write",
            ObservationKind::Delegate => "delegate",
            ObservationKind::AgentStateChanged => "agent_state_changed",
            ObservationKind::Null => "null",
        }
    }
}

/// The kind of an event: which category, and which variant within it.
///
/// The action `null` and the observation `null` share a wire name, so
/// filters key on this pair rather than on the bare name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "name", rename_all = "snake_case")]
pub enum EventKind {
    /// An intent to act.
    Action(ActionKind),
    /// The result of an action or an ambient change.
    Observation(ObservationKind),
}

impl EventKind {
    /// Bookkeeping kinds with no task-relevant content. Default traversals
    /// skip these.
    pub const DEFAULT_HIDDEN: [EventKind; 4] = [
        EventKind::Action(ActionKind::Null),
        EventKind::Observation(ObservationKind::Null),
        EventKind::Action(ActionKind::ChangeAgentState),
        EventKind::Observation(ObservationKind::AgentStateChanged),
    ];

    /// The variant's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Action(kind) => kind.as_str(),
            EventKind::Observation(kind) => kind.as_str(),
        }
    }

    /// Whether this is an action kind.
    pub fn is_action(&self) -> bool {
        matches!(self, EventKind::Action(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Action(kind) => write!(f, "action:{}", kind.as_str()),
            EventKind::Observation(kind) => write!(f, "observation:{}", kind.as_str()),
        }
    }
}

impl From<ActionKind> for EventKind {
    fn from(kind: ActionKind) -> Self {
        EventKind::Action(kind)
    }
}

impl From<ObservationKind> for EventKind {
    fn from(kind: ObservationKind) -> Self {
        EventKind::Observation(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_kinds_are_distinct() {
        let action = EventKind::Action(ActionKind::Null);
        let observation = EventKind::Observation(ObservationKind::Null);
        assert_eq!(action.name(), observation.name());
        assert_ne!(action, observation);
    }

    #[test]
    fn display_names_category() {
        assert_eq!(
            EventKind::from(ObservationKind::AgentStateChanged).to_string(),
            "observation:agent_state_changed"
        );
        assert_eq!(EventKind::from(ActionKind::Finish).to_string(), "action:finish");
    }
}

//! Agent lifecycle states carried by state-change events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an agent is in its lifecycle.
///
/// Recorded by [`Action::ChangeAgentState`](crate::Action::ChangeAgentState)
/// when the agent asks for a transition and by
/// [`Observation::AgentStateChanged`](crate::Observation::AgentStateChanged)
/// once the controller has applied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Runtime and tools are still being prepared.
    Loading,
    /// Ready but not yet given a task.
    Init,
    /// Working on a task.
    Running,
    /// Blocked on the user.
    AwaitingUserInput,
    /// Suspended by the user.
    Paused,
    /// Stopped by the user.
    Stopped,
    /// Completed its task.
    Finished,
    /// Refused its task.
    Rejected,
    /// Hit an unrecoverable error.
    Error,
}

impl AgentState {
    /// The wire name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Loading => "loading",
            AgentState::Init => "init",
            AgentState::Running => "running",
            AgentState::AwaitingUserInput => "awaiting_user_input",
            AgentState::Paused => "paused",
            AgentState::Stopped => "stopped",
            AgentState::Finished => "finished",
            AgentState::Rejected => "rejected",
            AgentState::Error => "error",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Observations: records of what happened.

use crate::agent::AgentState;
use crate::kind::ObservationKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The result of an action, or an ambient change the agent should know
/// about. The variant name is written under the `observation` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "observation", rename_all = "snake_case")]
pub enum Observation {
    /// Content of a file that was read.
    Read {
        /// Path of the file.
        path: String,
        /// What was read.
        content: String,
    },
    /// A file write completed.
    Write {
        /// Path of the file.
        path: String,
        /// What was written.
        content: String,
    },
    /// A delegated sub-task finished. Closes a delegate range.
    Delegate {
        /// Results returned by the delegate.
        #[serde(default)]
        outputs: Map<String, Value>,
        /// Free-text report.
        #[serde(default)]
        content: String,
    },
    /// The controller moved the agent to a new state.
    AgentStateChanged {
        /// The state now in effect.
        agent_state: AgentState,
        /// Free-text report.
        #[serde(default)]
        content: String,
    },
    /// Nothing was observed.
    Null {
        /// Free-text content, usually empty.
        #[serde(default)]
        content: String,
    },
}

impl Observation {
    /// Which variant this is.
    pub fn kind(&self) -> ObservationKind {
        match self {
            Observation::Read { .. } => ObservationKind::Read,
            Observation::Write { .. } => ObservationKind::Write,
            Observation::Delegate { .. } => ObservationKind::Delegate,
            Observation::AgentStateChanged { .. } => ObservationKind::AgentStateChanged,
            Observation::Null { .. } => ObservationKind::Null,
        }
    }

    /// The free-text content every observation carries.
    pub fn content(&self) -> &str {
        match self {
            Observation::Read { content, .. }
            | Observation::Write { content, .. }
            | Observation::Delegate { content, .. }
            | Observation::AgentStateChanged { content, .. }
            | Observation::Null { content } => content,
        }
    }

    /// One-line human-readable summary.
    pub fn message(&self) -> String {
        match self {
            Observation::Read { path, .. } => format!("I read the file {path}."),
            Observation::Write { path, .. } => format!("I wrote to the file {path}."),
            Observation::Delegate { content, .. } => content.clone(),
            Observation::AgentStateChanged { agent_state, .. } => {
                format!("Agent state is now {agent_state}")
            }
            Observation::Null { .. } => "No observation".to_string(),
        }
    }

    /// A null observation with the given content.
    pub fn null(content: impl Into<String>) -> Self {
        Observation::Null {
            content: content.into(),
        }
    }

    /// A delegate completion with no outputs.
    pub fn delegate_done(content: impl Into<String>) -> Self {
        Observation::Delegate {
            outputs: Map::new(),
            content: content.into(),
        }
    }
}

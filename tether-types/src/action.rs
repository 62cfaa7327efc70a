//! Actions: records of what an agent or user intends to do.

use crate::agent::AgentState;
use crate::kind::ActionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An intent to act.
///
/// Closed set: filters and serialization match on every variant, so
/// adding one is a deliberate, compiler-checked change. The variant name
/// is written under the `action` key; the fields sit next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Read a file, optionally a line window of it.
    Read {
        /// Path of the file.
        path: String,
        /// First line to read.
        #[serde(default)]
        start: usize,
        /// Line to stop at. `None` reads to the end.
        #[serde(default)]
        end: Option<usize>,
        /// The agent's reasoning.
        #[serde(default)]
        thought: String,
    },
    /// Write content to a file, optionally into a line window.
    Write {
        /// Path of the file.
        path: String,
        /// Text to write.
        content: String,
        /// First line replaced.
        #[serde(default)]
        start: usize,
        /// Line the replacement stops at. `None` means the end.
        #[serde(default)]
        end: Option<usize>,
        /// The agent's reasoning.
        #[serde(default)]
        thought: String,
    },
    /// A chat message between user and agent.
    Message {
        /// Message text.
        content: String,
        /// Images attached to the message.
        #[serde(default)]
        image_urls: Vec<String>,
        /// Whether the sender is now waiting on a reply.
        #[serde(default)]
        wait_for_response: bool,
    },
    /// Hand a sub-task to another agent. Opens a delegate range.
    Delegate {
        /// Name of the agent taking the task.
        agent: String,
        /// Inputs for the delegate; `task` holds the task description.
        #[serde(default)]
        inputs: Map<String, Value>,
        /// The agent's reasoning.
        #[serde(default)]
        thought: String,
    },
    /// Ask the controller to move the agent to another state.
    ChangeAgentState {
        /// Requested state.
        agent_state: AgentState,
        /// The agent's reasoning.
        #[serde(default)]
        thought: String,
    },
    /// The task is complete.
    Finish {
        /// Results handed back to whoever started the task.
        #[serde(default)]
        outputs: Map<String, Value>,
        /// The agent's reasoning.
        #[serde(default)]
        thought: String,
    },
    /// No-op.
    Null,
}

impl Action {
    /// Which variant this is.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Read { .. } => ActionKind::Read,
            Action::Write { .. } => ActionKind::Write,
            Action::Message { .. } => ActionKind::Message,
            Action::Delegate { .. } => ActionKind::Delegate,
            Action::ChangeAgentState { .. } => ActionKind::ChangeAgentState,
            Action::Finish { .. } => ActionKind::Finish,
            Action::Null => ActionKind::Null,
        }
    }

    /// One-line human-readable summary.
    pub fn message(&self) -> String {
        match self {
            Action::Read { path, .. } => format!("Reading file: {path}"),
            Action::Write { path, .. } => format!("Writing file: {path}"),
            Action::Message { content, .. } => content.clone(),
            Action::Delegate { agent, .. } => {
                format!("I'm asking {agent} for help with this task.")
            }
            Action::ChangeAgentState { agent_state, .. } => {
                format!("Agent state changed to {agent_state}")
            }
            Action::Finish { thought, .. } if !thought.is_empty() => thought.clone(),
            Action::Finish { .. } => "All done! What's next on the agenda?".to_string(),
            Action::Null => "No action".to_string(),
        }
    }

    /// Read a whole file.
    pub fn read(path: impl Into<String>) -> Self {
        Action::Read {
            path: path.into(),
            start: 0,
            end: None,
            thought: String::new(),
        }
    }

    /// Replace a whole file.
    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        Action::Write {
            path: path.into(),
            content: content.into(),
            start: 0,
            end: None,
            thought: String::new(),
        }
    }

    /// A text-only message.
    pub fn message_text(content: impl Into<String>) -> Self {
        Action::Message {
            content: content.into(),
            image_urls: Vec::new(),
            wait_for_response: false,
        }
    }

    /// Delegate `task` to `agent`.
    pub fn delegate(agent: impl Into<String>, task: impl Into<String>) -> Self {
        let mut inputs = Map::new();
        inputs.insert("task".to_string(), Value::String(task.into()));
        Action::Delegate {
            agent: agent.into(),
            inputs,
            thought: String::new(),
        }
    }

    /// Request a state transition.
    pub fn change_state(agent_state: AgentState) -> Self {
        Action::ChangeAgentState {
            agent_state,
            thought: String::new(),
        }
    }

    /// Finish with no outputs.
    pub fn finish() -> Self {
        Action::Finish {
            outputs: Map::new(),
            thought: String::new(),
        }
    }
}

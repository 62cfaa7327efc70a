#![deny(missing_docs)]
//! Conversation-level queries over a tether event stream.
//!
//! [`ConversationMemory`] answers the questions an agent loop asks on
//! every step: what the user currently wants, what was done last, what was
//! seen last. Every query starts at the stream's start offset, hides the
//! null and agent-state kinds, and skips events inside delegate ranges, so
//! a sub-agent's work and anything before the last reset stay out of view.

use std::sync::Arc;
use tether_stream::{EventQuery, EventReader};
use tether_types::{Action, Event, EventId, EventSource};

/// The user's current request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserIntent {
    /// Message text.
    pub text: String,
    /// Images attached to the message.
    pub image_urls: Vec<String>,
}

/// Read-only view of one stream's conversation.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    reader: EventReader,
}

impl ConversationMemory {
    /// Wrap a stream reader.
    pub fn new(reader: EventReader) -> Self {
        Self { reader }
    }

    /// The underlying reader.
    pub fn reader(&self) -> &EventReader {
        &self.reader
    }

    fn query(&self) -> EventQuery {
        EventQuery::default().start(self.reader.start_offset())
    }

    /// All visible events, oldest first unless `reverse`.
    pub fn events(&self, reverse: bool, include_delegates: bool) -> Vec<Arc<Event>> {
        let mut query = self.query();
        query.reverse = reverse;
        query.include_delegates = include_delegates;
        self.reader.events(&query).collect()
    }

    /// Visible events among the newest `n` ids.
    ///
    /// The window is counted in ids, not in visible events, so hidden kinds
    /// inside it shrink the result.
    pub fn last_events(&self, n: usize) -> Vec<Arc<Event>> {
        let Some(latest) = self.reader.latest_id() else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }
        let window_start = (latest.get() + 1).saturating_sub(n as u64);
        let start = self.reader.start_offset().max(EventId::new(window_start));
        let query = EventQuery::default().start(start).end(latest);
        self.reader.events(&query).collect()
    }

    /// The message the agent is currently working on.
    ///
    /// Walking back from the newest event, this is the earliest user
    /// message after the most recent `finish` action. If nothing has
    /// finished since the start offset, it is the first user message.
    pub fn current_user_intent(&self) -> Option<UserIntent> {
        let mut intent = None;
        for event in self.reader.events(&self.query().reverse()) {
            match event.as_action() {
                Some(Action::Message {
                    content,
                    image_urls,
                    ..
                }) if event.source == EventSource::User => {
                    intent = Some(UserIntent {
                        text: content.clone(),
                        image_urls: image_urls.clone(),
                    });
                }
                Some(Action::Finish { .. }) if intent.is_some() => break,
                _ => {}
            }
        }
        intent
    }

    /// Newest action with an id strictly below `before`. `None` means
    /// below the latest id, so the event being reacted to is skipped.
    pub fn last_action(&self, before: Option<EventId>) -> Option<Arc<Event>> {
        self.newest_before(before, |event| event.as_action().is_some())
    }

    /// Newest observation with an id strictly below `before`. `None`
    /// means below the latest id.
    pub fn last_observation(&self, before: Option<EventId>) -> Option<Arc<Event>> {
        self.newest_before(before, |event| event.as_observation().is_some())
    }

    /// Content of the newest user message, or an empty string.
    pub fn last_user_message(&self) -> String {
        self.last_message_from(EventSource::User)
    }

    /// Content of the newest agent message, or an empty string.
    pub fn last_agent_message(&self) -> String {
        self.last_message_from(EventSource::Agent)
    }

    fn newest_before(
        &self,
        before: Option<EventId>,
        matches: impl Fn(&Event) -> bool,
    ) -> Option<Arc<Event>> {
        let end = before.or_else(|| self.reader.latest_id())?.prev()?;
        let query = self.query().end(end).reverse();
        self.reader.events(&query).find(|event| matches(event))
    }

    fn last_message_from(&self, source: EventSource) -> String {
        self.reader
            .events(&self.query().reverse())
            .find_map(|event| match event.as_action() {
                Some(Action::Message { content, .. }) if event.source == source => {
                    Some(content.clone())
                }
                _ => None,
            })
            .unwrap_or_default()
    }
}

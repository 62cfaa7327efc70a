//! The notification seam: reacting to new events.

use crate::error::SubscriberError;
use crate::event::Event;
use async_trait::async_trait;

/// Receives every event appended to a stream after registration.
///
/// For any one subscriber, events arrive in strictly ascending id order
/// and none are skipped. Whether a callback runs on the appending task
/// or on a task of its own is decided at registration time.
///
/// Implementations:
/// - DelegateTracker: records delegated sub-task ranges
/// - controllers and UIs reacting to agent progress
///
/// Returning an error does NOT fail the append that produced the event;
/// the registry logs it and moves on to the next subscriber.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Called once per new event.
    async fn on_event(&self, event: &Event) -> Result<(), SubscriberError>;
}

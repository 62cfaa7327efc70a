//! Test doubles for subscribers and stores.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations for exercising the log's delivery and failure paths.

mod failing_subscriber;
mod flaky_store;
mod recording_subscriber;
mod slow_subscriber;

pub use failing_subscriber::FailingSubscriber;
pub use flaky_store::FlakyStore;
pub use recording_subscriber::RecordingSubscriber;
pub use slow_subscriber::SlowSubscriber;

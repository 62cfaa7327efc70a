//! Ordered subscriber registry.
//!
//! Each entry is either inline (awaited inside `append`) or queued (fed
//! through a private unbounded channel drained by its own task). Every
//! callback runs on a spawned task so a panic stays with its subscriber.

use crate::config::StreamConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tether_types::{Event, Subscriber, SubscriberId};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Where a new subscriber goes in the notification order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    /// After every existing subscriber.
    #[default]
    Append,
    /// Before every existing subscriber.
    Prepend,
}

/// How events reach a subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Through a private queue drained by the subscriber's own task.
    /// `append` never waits on it.
    #[default]
    Queued,
    /// Awaited inside `append`, after the event is durable and before
    /// `append` returns.
    Inline,
}

/// Options for [`EventStream::subscribe_with`](crate::EventStream::subscribe_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Position in the notification order.
    pub position: Position,
    /// Delivery mode.
    pub delivery: Delivery,
}

impl SubscribeOptions {
    /// Notify this subscriber before all others.
    pub fn prepend(mut self) -> Self {
        self.position = Position::Prepend;
        self
    }

    /// Deliver inline instead of through a queue.
    pub fn inline(mut self) -> Self {
        self.delivery = Delivery::Inline;
        self
    }
}

enum Message {
    Event(Arc<Event>),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
enum Sink {
    Inline(Arc<dyn Subscriber>),
    Queued {
        tx: mpsc::UnboundedSender<Message>,
        backlog: Arc<AtomicUsize>,
    },
}

#[derive(Clone)]
struct Entry {
    name: SubscriberId,
    sink: Sink,
}

pub(crate) struct SubscriberRegistry {
    entries: RwLock<Vec<Entry>>,
    runtime: Handle,
    backlog_warning: usize,
    callback_timeout: Option<Duration>,
}

impl SubscriberRegistry {
    pub(crate) fn new(config: &StreamConfig, runtime: Handle) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            runtime,
            backlog_warning: config.backlog_warning,
            callback_timeout: config.callback_timeout,
        }
    }

    /// Register `subscriber` under `name`, replacing any entry with the
    /// same name. A replaced queued subscriber finishes its backlog first.
    pub(crate) fn register(
        &self,
        name: SubscriberId,
        subscriber: Arc<dyn Subscriber>,
        options: SubscribeOptions,
    ) {
        let sink = match options.delivery {
            Delivery::Inline => Sink::Inline(subscriber),
            Delivery::Queued => {
                let (tx, rx) = mpsc::unbounded_channel();
                let backlog = Arc::new(AtomicUsize::new(0));
                self.runtime.spawn(drain(
                    name.clone(),
                    subscriber,
                    rx,
                    Arc::clone(&backlog),
                    self.callback_timeout,
                ));
                Sink::Queued { tx, backlog }
            }
        };
        let entry = Entry {
            name: name.clone(),
            sink,
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|existing| existing.name != name);
        match options.position {
            Position::Append => entries.push(entry),
            Position::Prepend => entries.insert(0, entry),
        }
        debug!(
            subscriber = %name,
            position = ?options.position,
            delivery = ?options.delivery,
            "subscriber registered"
        );
    }

    /// Remove the entry named `name`. Returns whether one existed.
    pub(crate) fn unregister(&self, name: &SubscriberId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|existing| &existing.name != name);
        let removed = entries.len() != before;
        if removed {
            debug!(subscriber = %name, "subscriber removed");
        }
        removed
    }

    pub(crate) fn names(&self) -> Vec<SubscriberId> {
        self.snapshot().into_iter().map(|entry| entry.name).collect()
    }

    fn snapshot(&self) -> Vec<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hand `event` to every subscriber in registration order.
    pub(crate) async fn notify(&self, event: &Arc<Event>) {
        for entry in self.snapshot() {
            match entry.sink {
                Sink::Inline(subscriber) => {
                    deliver(&entry.name, &subscriber, Arc::clone(event), self.callback_timeout)
                        .await;
                }
                Sink::Queued { tx, backlog } => {
                    let depth = backlog.fetch_add(1, Ordering::AcqRel) + 1;
                    if tx.send(Message::Event(Arc::clone(event))).is_err() {
                        backlog.fetch_sub(1, Ordering::AcqRel);
                        warn!(subscriber = %entry.name, "subscriber queue closed");
                        continue;
                    }
                    if depth == self.backlog_warning {
                        warn!(
                            subscriber = %entry.name,
                            backlog = depth,
                            "subscriber is falling behind"
                        );
                    }
                }
            }
        }
    }

    /// Wait until every queued subscriber has handled everything enqueued
    /// before this call.
    pub(crate) async fn flush(&self) {
        let mut pending = Vec::new();
        for entry in self.snapshot() {
            if let Sink::Queued { tx, .. } = entry.sink {
                let (done, wait) = oneshot::channel();
                if tx.send(Message::Flush(done)).is_ok() {
                    pending.push(wait);
                }
            }
        }
        for wait in pending {
            // A closed queue has nothing left to flush.
            let _ = wait.await;
        }
    }
}

async fn drain(
    name: SubscriberId,
    subscriber: Arc<dyn Subscriber>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    backlog: Arc<AtomicUsize>,
    callback_timeout: Option<Duration>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Event(event) => {
                deliver(&name, &subscriber, event, callback_timeout).await;
                backlog.fetch_sub(1, Ordering::AcqRel);
            }
            Message::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!(subscriber = %name, "subscriber queue drained");
}

/// Run one callback on its own task. Errors, panics, and timeouts are
/// logged here and go no further.
async fn deliver(
    name: &SubscriberId,
    subscriber: &Arc<dyn Subscriber>,
    event: Arc<Event>,
    callback_timeout: Option<Duration>,
) {
    let event_id = event.id;
    let subscriber = Arc::clone(subscriber);
    let mut task = tokio::spawn(async move { subscriber.on_event(&event).await });

    let joined = match callback_timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                warn!(
                    subscriber = %name,
                    event_id = %event_id,
                    timeout_ms = limit.as_millis() as u64,
                    "subscriber timed out"
                );
                return;
            }
        },
        None => task.await,
    };

    match joined {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            warn!(subscriber = %name, event_id = %event_id, error = %error, "subscriber failed");
        }
        Err(join_error) if join_error.is_panic() => {
            warn!(subscriber = %name, event_id = %event_id, "subscriber panicked");
        }
        Err(join_error) => {
            warn!(
                subscriber = %name,
                event_id = %event_id,
                error = %join_error,
                "subscriber task cancelled"
            );
        }
    }
}

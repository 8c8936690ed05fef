//! Event sinks.
//!
//! Hashers receive an `Arc<dyn EventSink>` at construction and report
//! failures and progress through it. Pick the implementation that fits the
//! caller: a crossbeam channel for a UI or persistence thread, `tracing`
//! records for plain logging, or nothing at all.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{BatchEvent, Event, HashEvent};

/// Destination for hashing events
pub trait EventSink: Send + Sync {
    /// Deliver one event. Must not block for long and must not panic.
    fn emit(&self, event: Event);
}

/// Sends events over a crossbeam channel.
///
/// Cloneable and usable from any worker thread.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender.
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }
}

impl EventSink for EventSender {
    fn emit(&self, event: Event) {
        // A dropped receiver only means nobody is listening
        let _ = self.inner.send(event);
    }
}

/// Receiving half of an [`EventChannel`]
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event, or `None` once all senders are gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Receive an event if one is queued
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; events are small.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }

    /// Bounded channel. Workers block when the consumer falls behind.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }
}

/// Re-emits events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event {
            Event::Batch(BatchEvent::Started {
                total_files,
                workers,
            }) => info!(total_files, workers, "hashing batch started"),
            Event::Batch(BatchEvent::Completed(summary)) => info!(
                total_files = summary.total_files,
                complete = summary.complete,
                identity_only = summary.identity_only,
                unreadable = summary.unreadable,
                duration_ms = summary.duration_ms,
                "hashing batch completed"
            ),
            Event::Hash(HashEvent::Progress(progress)) => debug!(
                completed = progress.completed,
                total = progress.total,
                path = %progress.current_path.display(),
                "file finished"
            ),
            Event::Hash(HashEvent::FileHashed { path }) => {
                debug!(path = %path.display(), "file hashed")
            }
            Event::Hash(HashEvent::Failed {
                path,
                stage,
                message,
            }) => warn!(
                path = %path.display(),
                %stage,
                error = %message,
                "hashing stage failed"
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Shared no-op sink for tests and callers that only read results.
pub fn null_sink() -> Arc<dyn EventSink> {
    Arc::new(NullSink)
}

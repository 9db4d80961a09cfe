//! Forward tracing events to the host's activity log.
//!
//! Hosts keep a persistent activity log that accepts informational and error
//! entries tagged with a source. This module provides a small tracing
//! [`Layer`] that forwards `INFO` and `ERROR` events from our crates to such a
//! log when one is installed:
//! - Call [`set_sink`] with an [`ActivitySink`] once the host log is available.
//! - Install the [`layer`] in your tracing subscriber.
//! - Call [`clear_sink`] when the host log goes away.
//!
//! With no sink installed the layer does nothing and events only reach the
//! other layers of the subscriber.

use std::{
    cell::Cell,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tracing::{Event, Level, Subscriber, debug};
use tracing_subscriber::layer::{Context, Layer};

use crate::{OUR_CRATES, fmt};

/// Kind of activity-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Informational entry.
    Information,
    /// Error entry.
    Error,
}

impl EntryKind {
    /// Entry kind for events at `level`; `None` for levels that are not forwarded.
    pub fn for_level(level: &Level) -> Option<Self> {
        match *level {
            Level::INFO => Some(Self::Information),
            Level::ERROR => Some(Self::Error),
            _ => None,
        }
    }
}

/// A host activity log.
pub trait ActivitySink: Send {
    /// Append one entry. A non-zero status code signals the host rejected it.
    fn log_entry(&mut self, kind: EntryKind, source: &str, message: &str) -> Result<(), i32>;
}

/// The installed sink, if any.
static SINK: Mutex<Option<Box<dyn ActivitySink>>> = Mutex::new(None);

/// Entries the sink rejected.
static REJECTED: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Set while this thread is inside [`ActivitySink::log_entry`].
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Install `sink`, replacing any previous one.
pub fn set_sink(sink: impl ActivitySink + 'static) {
    *SINK.lock() = Some(Box::new(sink));
}

/// Remove the installed sink.
pub fn clear_sink() {
    *SINK.lock() = None;
}

/// Number of entries the installed sinks have rejected so far.
pub fn rejected_count() -> u64 {
    REJECTED.load(Ordering::Relaxed)
}

/// Tracing layer that forwards events to the activity log when a sink is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityLayer;

impl<S> Layer<S> for ActivityLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(kind) = EntryKind::for_level(event.metadata().level()) else {
            return;
        };
        // Events raised by the sink itself are not fed back into it.
        if FORWARDING.with(Cell::get) {
            return;
        }
        let r = fmt::render_event(event);
        if !OUR_CRATES.contains(&r.source()) {
            return;
        }

        let status = {
            let mut guard = SINK.lock();
            let Some(sink) = guard.as_mut() else { return };
            FORWARDING.with(|f| f.set(true));
            let status = sink.log_entry(kind, r.source(), &r.message);
            FORWARDING.with(|f| f.set(false));
            status
        };
        if let Err(code) = status {
            let n = REJECTED.fetch_add(1, Ordering::Relaxed) + 1;
            if n == 1 || n.is_multiple_of(100) {
                debug!(code, count = n, "activity log rejected entry");
            }
        }
    }
}

/// Create the forwarding layer instance to add to your subscriber.
pub fn layer() -> ActivityLayer {
    ActivityLayer
}

use std::sync::Arc;

use logging::sink::{self, ActivitySink, EntryKind};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;

/// Entries written so far: kind, source, message.
type Entries = Arc<Mutex<Vec<(EntryKind, String, String)>>>;

/// Records entries; rejects everything once `reject` is set.
struct Recorder {
    /// Shared record of accepted entries.
    entries: Entries,
    /// Status code to fail with.
    reject: Option<i32>,
}

impl ActivitySink for Recorder {
    fn log_entry(&mut self, kind: EntryKind, source: &str, message: &str) -> Result<(), i32> {
        if let Some(code) = self.reject {
            return Err(code);
        }
        self.entries
            .lock()
            .push((kind, source.to_string(), message.to_string()));
        Ok(())
    }
}

/// The sink is process-global; keep tests from interleaving.
static SERIAL: Mutex<()> = Mutex::new(());

#[test]
fn forwards_info_and_error_until_cleared() {
    let _serial = SERIAL.lock();
    let entries = Entries::default();
    sink::set_sink(Recorder {
        entries: entries.clone(),
        reject: None,
    });

    let subscriber = tracing_subscriber::registry().with(sink::layer());
    tracing::subscriber::with_default(subscriber, || {
        info!(target: "relocate::engine", "moved control to title bar");
        error!(target: "relocate::anchors", query = "TopDockTray", "could not find source container");
        warn!(target: "relocate::engine", "not forwarded");
        debug!(target: "relocate::engine", "not forwarded");
        info!(target: "some_other_crate", "not ours");

        sink::clear_sink();
        info!(target: "relocate::engine", "after clear");
    });

    let got = entries.lock().clone();
    assert_eq!(got.len(), 2, "{got:?}");
    assert_eq!(got[0].0, EntryKind::Information);
    assert_eq!(got[0].1, "relocate");
    assert_eq!(got[0].2, "moved control to title bar");
    assert_eq!(got[1].0, EntryKind::Error);
    assert_eq!(
        got[1].2,
        "could not find source container query=\"TopDockTray\""
    );
}

#[test]
fn rejected_entries_are_counted() {
    let _serial = SERIAL.lock();
    let before = sink::rejected_count();
    sink::set_sink(Recorder {
        entries: Entries::default(),
        reject: Some(-1),
    });

    let subscriber = tracing_subscriber::registry().with(sink::layer());
    tracing::subscriber::with_default(subscriber, || {
        info!(target: "host_tree", "one");
        info!(target: "host_tree", "two");
    });
    sink::clear_sink();

    assert_eq!(sink::rejected_count() - before, 2);
}

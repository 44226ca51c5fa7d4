//! Append-only execution log with filtered views and live streaming.
//!
//! The [`ExecutionLog`] is the ordered record of everything a run did:
//! start/success/error transitions, connector stdout/stderr, warnings. The
//! runner writes it; the log panel reads it through [`LogFilter`] views and a
//! live subscription. History grows until the user explicitly clears it —
//! unbounded growth is an accepted limitation of a single interactive
//! session.
//!
//! Additional [`LogSink`]s can be attached for side channels (stdout
//! mirroring, streaming to a client); fan-out happens synchronously in append
//! order so all consumers observe the same linear log.
//!
//! # Examples
//!
//! ```rust
//! use dagwire::event_log::{ExecutionLog, LogEntry, LogFilter, LogKind};
//!
//! let log = ExecutionLog::new();
//! log.append(LogEntry::new("n1", "fetch", LogKind::Info, "starting"));
//! log.append(LogEntry::new("n1", "fetch", LogKind::Success, "done in 12ms"));
//!
//! let filter = LogFilter::new().with_kind(LogKind::Success);
//! let (total, filtered) = log.counts(&filter);
//! assert_eq!((total, filtered), (2, 1));
//! ```

mod entry;
mod sink;

pub use entry::{LogEntry, LogFilter, LogKind};
pub use sink::{ChannelSink, LogSink, MemorySink, StdOutSink};

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct ExecutionLogInner {
    entries: Vec<LogEntry>,
    sinks: Vec<Box<dyn LogSink>>,
    subscribers: Vec<flume::Sender<LogEntry>>,
}

/// Shared, append-only store of [`LogEntry`] records.
///
/// Cheap to clone; clones share the same underlying log.
#[derive(Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<Mutex<ExecutionLogInner>>,
}

impl ExecutionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink that receives every subsequent entry.
    pub fn add_sink<T: LogSink + 'static>(&self, sink: T) {
        self.inner.lock().sinks.push(Box::new(sink));
    }

    /// Append an entry, fan it out to sinks, and notify subscribers.
    pub fn append(&self, entry: LogEntry) {
        let mut inner = self.inner.lock();
        for sink in inner.sinks.iter_mut() {
            if let Err(e) = sink.handle(&entry) {
                tracing::warn!(error = %e, "log sink failed to handle entry");
            }
        }
        inner
            .subscribers
            .retain(|tx| tx.send(entry.clone()).is_ok());
        inner.entries.push(entry);
    }

    /// All entries, in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.clone()
    }

    /// Entries passing `filter`, in append order.
    #[must_use]
    pub fn filtered(&self, filter: &LogFilter) -> Vec<LogEntry> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// `(total, matching)` entry counts for the log panel's footer.
    #[must_use]
    pub fn counts(&self, filter: &LogFilter) -> (usize, usize) {
        let inner = self.inner.lock();
        let total = inner.entries.len();
        let matching = inner.entries.iter().filter(|e| filter.matches(e)).count();
        (total, matching)
    }

    /// All entries for one node.
    #[must_use]
    pub fn entries_for_node(&self, node_id: &str) -> Vec<LogEntry> {
        self.filtered(&LogFilter::new().for_node(node_id))
    }

    /// All entries grouped under one run.
    #[must_use]
    pub fn entries_for_run(&self, run_id: &str) -> Vec<LogEntry> {
        self.filtered(&LogFilter::new().for_run(run_id))
    }

    /// Irreversibly drop the whole history. Explicit user action only; there
    /// is no automatic eviction.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Drop every entry belonging to one node, e.g. when it is deleted.
    pub fn clear_node(&self, node_id: &str) {
        self.inner
            .lock()
            .entries
            .retain(|e| e.node_id != node_id);
    }

    /// Subscribe to the live entry stream. Dropped receivers are pruned on
    /// the next append.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<LogEntry> {
        let (tx, rx) = flume::unbounded();
        self.inner.lock().subscribers.push(tx);
        rx
    }
}

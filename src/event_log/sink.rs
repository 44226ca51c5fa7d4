use std::io::{self, Result as IoResult, Stdout, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use super::entry::LogEntry;

/// Abstraction over an output target that consumes full log entries.
///
/// Sinks receive entries synchronously, in append order, from
/// [`ExecutionLog::append`](super::ExecutionLog::append); a slow sink slows
/// the run rather than reordering the log.
pub trait LogSink: Send + Sync {
    /// Handle one entry. The sink decides how to format or forward it.
    fn handle(&mut self, entry: &LogEntry) -> IoResult<()>;
}

/// Stdout sink, one formatted line per entry. Useful for CLI debugging of a
/// pipeline outside the visual shell.
pub struct StdOutSink {
    handle: Stdout,
}

impl Default for StdOutSink {
    fn default() -> Self {
        Self {
            handle: io::stdout(),
        }
    }
}

impl LogSink for StdOutSink {
    fn handle(&mut self, entry: &LogEntry) -> IoResult<()> {
        writeln!(self.handle, "{entry}")?;
        self.handle.flush()
    }
}

/// In-memory sink for tests and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured entries.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn handle(&mut self, entry: &LogEntry) -> IoResult<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}

/// Channel-based sink for streaming entries to an async consumer such as the
/// log panel.
///
/// Entries are forwarded without blocking; a dropped receiver turns the sink
/// into a no-op rather than an error so a closed panel never fails a run.
pub struct ChannelSink {
    tx: flume::Sender<LogEntry>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: flume::Sender<LogEntry>) -> Self {
        Self { tx }
    }
}

impl LogSink for ChannelSink {
    fn handle(&mut self, entry: &LogEntry) -> IoResult<()> {
        let _ = self.tx.send(entry.clone());
        Ok(())
    }
}

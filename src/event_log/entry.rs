use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{NodeId, RunId};

/// Category of a log entry, mirroring the severity levels of the
/// execution-log panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Stdout,
    Stderr,
    Info,
    Error,
    Success,
    Warning,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogKind::Stdout => "stdout",
            LogKind::Stderr => "stderr",
            LogKind::Info => "info",
            LogKind::Error => "error",
            LogKind::Success => "success",
            LogKind::Warning => "warning",
        };
        write!(f, "{label}")
    }
}

/// One record in the execution log.
///
/// Entries are append-only within a run; `run_id` groups every entry emitted
/// by one `run_node` invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub node_id: NodeId,
    pub node_name: String,
    pub kind: LogKind,
    pub message: String,
    pub run_id: Option<RunId>,
}

impl LogEntry {
    pub fn new(
        node_id: impl Into<NodeId>,
        node_name: impl Into<String>,
        kind: LogKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            node_id: node_id.into(),
            node_name: node_name.into(),
            kind,
            message: message.into(),
            run_id: None,
        }
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<RunId>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}] {} {}",
            self.timestamp.format("%H:%M:%S"),
            self.kind,
            self.node_name,
            self.message
        )
    }
}

/// Predicate over log entries for the derived, filtered views.
///
/// All criteria are conjunctive; an empty filter matches everything.
#[derive(Clone, Debug, Default)]
pub struct LogFilter {
    /// Match only these kinds; empty means all kinds.
    pub kinds: Vec<LogKind>,
    /// Case-insensitive substring match against the message.
    pub text: Option<String>,
    pub node_id: Option<NodeId>,
    pub run_id: Option<RunId>,
}

impl LogFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_kind(mut self, kind: LogKind) -> Self {
        self.kinds.push(kind);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn for_node(mut self, node_id: impl Into<NodeId>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    #[must_use]
    pub fn for_run(mut self, run_id: impl Into<RunId>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Whether `entry` passes every populated criterion.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&entry.kind) {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !entry.message.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(node_id) = &self.node_id
            && &entry.node_id != node_id
        {
            return false;
        }
        if let Some(run_id) = &self.run_id
            && entry.run_id.as_ref() != Some(run_id)
        {
            return false;
        }
        true
    }
}

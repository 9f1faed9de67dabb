//! Incremental log output for a remote job.
//!
//! [`LogCursor`] counts the entries already fetched so the next `poll` only
//! asks for new ones. [`filter_and_print`] decides which of those reach the
//! [`LogSink`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rpc::{LogEntry, TaskState};

/// Minimum level of server log lines to surface.
///
/// This is a set membership test, not a numeric threshold: `Debug` admits
/// `DEBUG` and `INFO`, `Info` admits only `INFO`. Warnings and errors emitted
/// by the server are not part of either set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
}

impl LogLevel {
    pub fn level_names(self) -> &'static [&'static str] {
        match self {
            LogLevel::Debug => &["INFO", "DEBUG"],
            LogLevel::Info => &["INFO"],
        }
    }

    pub fn admits(self, levelname: &str) -> bool {
        self.level_names().contains(&levelname)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
        }
    }
}

/// Where surfaced log messages and state changes go.
pub trait LogSink {
    fn emit(&mut self, message: &str);

    /// Called once per poll with the state `ps` reported.
    fn observe(&mut self, _state: &TaskState) {}
}

impl LogSink for Vec<String> {
    fn emit(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Count of log entries already fetched for the current job. Never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCursor(usize);

impl LogCursor {
    pub fn new() -> Self {
        Self(0)
    }

    /// Offset to send as `logs_start` on the next poll.
    pub fn position(self) -> usize {
        self.0
    }

    pub fn advance(&mut self, fetched: usize) {
        self.0 = self.0.saturating_add(fetched);
    }
}

/// Emits the `message` of every entry admitted by `level`, in order.
///
/// Returns how many entries were passed in, not how many were emitted: the
/// caller advances its cursor by this amount.
pub fn filter_and_print(entries: &[LogEntry], level: LogLevel, sink: &mut impl LogSink) -> usize {
    for entry in entries.iter().filter(|e| level.admits(&e.levelname)) {
        sink.emit(&entry.message);
    }
    entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn entry(message: &str, levelname: &str) -> LogEntry {
        LogEntry {
            timestamp: None,
            message: message.to_string(),
            channel: Some("dbt".into()),
            level: None,
            levelname: levelname.to_string(),
            thread_name: None,
            process: None,
            extra: Map::new(),
            exc_info: None,
        }
    }

    #[test]
    fn info_level_prints_only_info() {
        let entries = vec![
            entry("a", "INFO"),
            entry("b", "DEBUG"),
            entry("c", "INFO"),
            entry("d", "DEBUG"),
            entry("e", "INFO"),
        ];
        let mut out: Vec<String> = Vec::new();
        let n = filter_and_print(&entries, LogLevel::Info, &mut out);
        assert_eq!(n, 5);
        assert_eq!(out, vec!["a", "c", "e"]);
    }

    #[test]
    fn debug_level_prints_info_and_debug() {
        let entries = vec![entry("a", "DEBUG"), entry("b", "INFO"), entry("c", "WARNING")];
        let mut out: Vec<String> = Vec::new();
        let n = filter_and_print(&entries, LogLevel::Debug, &mut out);
        assert_eq!(n, 3);
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn empty_batch_prints_nothing() {
        let mut out: Vec<String> = Vec::new();
        assert_eq!(filter_and_print(&[], LogLevel::Debug, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn cursor_progression_never_reprints() {
        let server_log = vec![
            entry("m1", "INFO"),
            entry("m2", "DEBUG"),
            entry("m3", "INFO"),
            entry("m4", "INFO"),
        ];
        let mut cursor = LogCursor::new();
        let mut out: Vec<String> = Vec::new();

        // First poll sees two entries, second poll the remaining two.
        for batch_end in [2, 4] {
            let batch = &server_log[cursor.position()..batch_end];
            let fetched = filter_and_print(batch, LogLevel::Info, &mut out);
            cursor.advance(fetched);
        }

        assert_eq!(cursor.position(), 4);
        assert_eq!(out, vec!["m1", "m3", "m4"]);
    }

    #[test]
    fn level_names_and_display() {
        assert!(LogLevel::Info.admits("INFO"));
        assert!(!LogLevel::Info.admits("DEBUG"));
        assert!(LogLevel::Debug.admits("DEBUG"));
        assert!(!LogLevel::Debug.admits("ERROR"));
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn level_deserializes_uppercase() {
        let level: LogLevel = serde_json::from_str(r#""DEBUG""#).unwrap();
        assert_eq!(level, LogLevel::Debug);
    }
}

//! Diagnostic output for completion providers.
//!
//! Providers never surface failures to the user; they decline and append a
//! line here instead. The server forwards lines to the client's log, tests
//! collect them in memory.

use std::sync::Mutex;

/// An append-only, line-oriented log.
pub trait LogSink: Send + Sync {
    fn append_line(&self, line: &str);
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemoryLog {
    fn append_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

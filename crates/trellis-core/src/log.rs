//! Log streams used while running test logic
//!
//! The invoker writes inconclusive outcomes to the warnings stream and
//! failures to the failures stream. Where the entries end up is up to the
//! [`LogSink`] in use.

use crate::outcome::Failure;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// An independently addressable log stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogStream {
    Warnings,
    Failures,
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStream::Warnings => f.write_str("warnings"),
            LogStream::Failures => f.write_str("failures"),
        }
    }
}

/// Destination for failures reported during a run
pub trait LogSink: Send + Sync {
    /// Write a failure, tagged with an optional description, to a stream
    fn write_failure(&self, stream: LogStream, failure: &Failure, description: Option<&str>);
}

/// Routes entries to `tracing`: warnings at WARN, failures at ERROR
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn write_failure(&self, stream: LogStream, failure: &Failure, description: Option<&str>) {
        let description = description.unwrap_or_default();
        match stream {
            LogStream::Warnings => {
                tracing::warn!(stream = %stream, description, "{}", failure)
            }
            LogStream::Failures => {
                tracing::error!(stream = %stream, description, "{}", failure)
            }
        }
    }
}

/// A captured log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub stream: LogStream,
    pub message: String,
    pub description: Option<String>,
}

/// Keeps every entry in memory
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in write order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries written to one stream
    pub fn entries_in(&self, stream: LogStream) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.stream == stream)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl LogSink for MemoryLogSink {
    fn write_failure(&self, stream: LogStream, failure: &Failure, description: Option<&str>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                stream,
                message: failure.to_string(),
                description: description.map(str::to_string),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_memory_sink_records_streams() {
        let sink = MemoryLogSink::new();
        assert!(sink.is_empty());

        sink.write_failure(LogStream::Failures, &Failure::message("broken"), Some("setup"));
        sink.write_failure(LogStream::Warnings, &Failure::inconclusive("unsure"), None);

        let failures = sink.entries_in(LogStream::Failures);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "broken");
        assert_eq!(failures[0].description.as_deref(), Some("setup"));

        let warnings = sink.entries_in(LogStream::Warnings);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].description, None);
    }

    /// In-memory writer for a scoped `fmt` subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_routes_streams_to_levels() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink = TracingLogSink;
            sink.write_failure(LogStream::Warnings, &Failure::message("disk almost full"), Some("setup"));
            sink.write_failure(LogStream::Failures, &Failure::message("disk full"), None);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("stream=warnings"));
        assert!(lines[0].contains("disk almost full"));
        assert!(lines[0].contains("setup"));
        assert!(lines[1].contains("ERROR"));
        assert!(lines[1].contains("stream=failures"));
        assert!(lines[1].contains("disk full"));
    }
}

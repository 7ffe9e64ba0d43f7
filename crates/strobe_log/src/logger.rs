//! The multi-sink logger.

use crate::record::{Level, LogRecord};
use crate::sink::LogSink;
use std::io;
use strobe_common::SimTime;

/// Append-only, timestamped record sink with multi-sink fan-out.
///
/// Every record is retained in an ordered transcript (taken by the
/// regression runner at scenario end) and forwarded to each attached sink.
/// There is no retraction: once written, a record is immutable.
#[derive(Default)]
pub struct Logger {
    sinks: Vec<Box<dyn LogSink>>,
    transcript: Vec<LogRecord>,
    error_count: usize,
}

impl Logger {
    /// Creates a logger with no attached sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a sink. Records logged earlier are not replayed.
    pub fn attach(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }

    /// Logs a message at the given virtual time and level.
    pub fn log(&mut self, time: SimTime, level: Level, message: impl Into<String>) {
        let record = LogRecord {
            time,
            level,
            message: message.into(),
        };
        if level == Level::Error {
            self.error_count += 1;
        }
        for sink in &mut self.sinks {
            sink.write(&record);
        }
        self.transcript.push(record);
    }

    /// Logs an informational message.
    pub fn info(&mut self, time: SimTime, message: impl Into<String>) {
        self.log(time, Level::Info, message);
    }

    /// Logs a warning.
    pub fn warn(&mut self, time: SimTime, message: impl Into<String>) {
        self.log(time, Level::Warn, message);
    }

    /// Logs an error.
    pub fn error(&mut self, time: SimTime, message: impl Into<String>) {
        self.log(time, Level::Error, message);
    }

    /// Flushes every attached sink, returning the first failure.
    pub fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    /// Returns the number of error-level records logged so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Returns a snapshot of the transcript without draining it.
    pub fn records(&self) -> &[LogRecord] {
        &self.transcript
    }

    /// Takes the full transcript, leaving the logger empty.
    pub fn take_transcript(&mut self) -> Vec<LogRecord> {
        std::mem::take(&mut self.transcript)
    }
}

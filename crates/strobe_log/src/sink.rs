//! Output sinks for log records.

use crate::record::LogRecord;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

/// A destination for log records.
///
/// `write` must not fail the simulation: sinks stash I/O errors and report
/// them from `flush`, which the kernel calls at the end of each time step
/// and on every termination path.
pub trait LogSink {
    /// Appends a record to the sink.
    fn write(&mut self, record: &LogRecord);

    /// Flushes buffered output, reporting any stashed write error.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A transient sink that prints records to standard output.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Creates a new console sink.
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for ConsoleSink {
    fn write(&mut self, record: &LogRecord) {
        println!("{record}");
    }
}

/// A durable sink that appends records to a file through a buffered writer.
pub struct FileSink {
    writer: BufWriter<File>,
    stashed: Option<io::Error>,
}

impl FileSink {
    /// Opens (or creates) the file at `path` in append mode.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            stashed: None,
        })
    }
}

impl LogSink for FileSink {
    fn write(&mut self, record: &LogRecord) {
        if self.stashed.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.writer, "{record}") {
            self.stashed = Some(e);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(e) = self.stashed.take() {
            return Err(e);
        }
        self.writer.flush()
    }
}

/// An in-memory sink backed by a shared buffer, for tests.
///
/// The buffer handle can be cloned before the sink is attached, so the test
/// retains access after the logger takes ownership of the sink.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buffer: Rc<RefCell<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Creates a new empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the shared record buffer.
    pub fn buffer(&self) -> Rc<RefCell<Vec<LogRecord>>> {
        Rc::clone(&self.buffer)
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, record: &LogRecord) {
        self.buffer.borrow_mut().push(record.clone());
    }
}

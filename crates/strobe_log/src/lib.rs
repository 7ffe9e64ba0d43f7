//! Timestamped, append-only logging for Strobe testbenches.
//!
//! The [`Logger`] records messages stamped with the virtual time at which
//! they were issued and fans each record out to any number of [`LogSink`]s
//! (console, file, in-memory). The logger also retains the full ordered
//! transcript, which the regression runner surrenders into the scenario
//! result at end of run. Records are immutable once written.
//!
//! The kernel is single-threaded by design, so no locking is involved.

#![warn(missing_docs)]

pub mod logger;
pub mod record;
pub mod sink;

pub use logger::Logger;
pub use record::{Level, LogRecord};
pub use sink::{ConsoleSink, FileSink, LogSink, MemorySink};

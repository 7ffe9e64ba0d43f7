//! Stimulus error types.

use std::io;

/// Errors that can occur while producing stimulus values.
#[derive(Debug, thiserror::Error)]
pub enum StimError {
    /// A value was demanded but the record source never yielded a valid record.
    #[error("no valid stimulus records in {path}")]
    NoStimulus {
        /// The record file the source was reading.
        path: String,
    },

    /// An unrecognized numeric format name in a configuration.
    #[error("unknown record format '{0}'")]
    UnknownFormat(String),

    /// An I/O error while reading a record source.
    #[error("stimulus I/O error: {0}")]
    Io(#[from] io::Error),
}

//! Log record and severity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use strobe_common::SimTime;

/// Severity of a log record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Informational message.
    Info,
    /// Recoverable anomaly, e.g. a skipped malformed stimulus record.
    Warn,
    /// Check mismatch or fatal condition.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warn => write!(f, "warn"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// A single timestamped log record.
///
/// The timestamp is the virtual time at which the record was issued;
/// records are ordered by issue order within a scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Virtual time at which the record was issued.
    pub time: SimTime,
    /// Record severity.
    pub level: Level,
    /// The message text.
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.time, self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_display() {
        assert_eq!(Level::Info.to_string(), "info");
        assert_eq!(Level::Warn.to_string(), "warn");
        assert_eq!(Level::Error.to_string(), "error");
    }

    #[test]
    fn level_ordering() {
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn record_display() {
        let r = LogRecord {
            time: SimTime::from_ns(10),
            level: Level::Warn,
            message: "skipping malformed record".into(),
        };
        assert_eq!(r.to_string(), "[10 ns] warn: skipping malformed record");
    }

    #[test]
    fn serde_roundtrip() {
        let r = LogRecord {
            time: SimTime::from_ns(5),
            level: Level::Error,
            message: "mismatch".into(),
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}

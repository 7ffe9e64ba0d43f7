//! Check outcomes and the shared scoreboard.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use strobe_common::{BitVec, SimTime};

/// Result of a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Observed value matched the expectation.
    Pass,
    /// Observed value diverged; the checker kept going.
    Mismatch,
    /// Observed value diverged under a fatal-on-mismatch policy.
    Fatal,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Mismatch => write!(f, "mismatch"),
            Verdict::Fatal => write!(f, "fatal"),
        }
    }
}

/// One recorded comparison between an observed and an expected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Simulation time at which the sample was taken.
    pub time: SimTime,
    /// Name of the checked signal.
    pub signal: String,
    /// The value the signal held at the sample point.
    pub observed: BitVec,
    /// The value the expectation stream supplied.
    pub expected: BitVec,
    /// Whether they matched.
    pub verdict: Verdict,
}

/// What a checker does when a sample mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnMismatch {
    /// Record the failure, log an error, and keep checking.
    Continue,
    /// Abort the entire run with a fatal report.
    Fatal,
}

/// Shared, append-only collection of check outcomes.
///
/// Cloning a scoreboard clones the handle, not the data: checkers running
/// inside the kernel and the harness inspecting results afterwards see the
/// same underlying list. The kernel is single-threaded, so plain
/// `Rc<RefCell<..>>` sharing is sufficient.
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    inner: Rc<RefCell<Vec<CheckOutcome>>>,
}

impl Scoreboard {
    /// Creates an empty scoreboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one outcome.
    pub fn record(&self, outcome: CheckOutcome) {
        self.inner.borrow_mut().push(outcome);
    }

    /// Number of recorded outcomes.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Number of passing outcomes.
    pub fn passed(&self) -> usize {
        self.inner
            .borrow()
            .iter()
            .filter(|o| o.verdict == Verdict::Pass)
            .count()
    }

    /// Number of non-passing outcomes.
    pub fn failed(&self) -> usize {
        self.inner
            .borrow()
            .iter()
            .filter(|o| o.verdict != Verdict::Pass)
            .count()
    }

    /// Snapshot of all outcomes in recording order.
    pub fn outcomes(&self) -> Vec<CheckOutcome> {
        self.inner.borrow().clone()
    }

    /// Drains all outcomes, leaving the scoreboard empty.
    pub fn take(&self) -> Vec<CheckOutcome> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }
}

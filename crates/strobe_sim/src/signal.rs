//! Signal storage and two-phase value state.

use serde::{Deserialize, Serialize};
use strobe_common::{Arena, ArenaId, BitVec};

use crate::error::SimError;
use crate::process::ProcessId;

/// Opaque handle to a registered signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(u32);

impl ArenaId for SignalId {
    fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

/// Current and pending state of one signal.
///
/// `value` is what every read observes. `pending` holds at most one deferred
/// write per instant: later non-blocking writes in the same instant replace
/// it, and the commit phase applies it. `sensitized` lists the processes
/// currently waiting for this signal to change; sensitization is one-shot
/// and the list is drained on every committed change.
#[derive(Debug)]
pub struct SignalState {
    /// Human-readable name, used in logs and scoreboard entries.
    pub name: String,
    /// Bit width. Writes are resized to this width before taking effect.
    pub width: u32,
    /// The currently visible value.
    pub value: BitVec,
    /// Deferred value awaiting the commit phase, if any.
    pub pending: Option<BitVec>,
    /// Processes to wake when the visible value next changes.
    pub sensitized: Vec<ProcessId>,
}

impl SignalState {
    fn new(name: String, width: u32) -> Self {
        Self {
            name,
            width,
            value: BitVec::new(width),
            pending: None,
            sensitized: Vec::new(),
        }
    }
}

/// The kernel's table of registered signals.
#[derive(Debug, Default)]
pub struct SignalTable {
    inner: Arena<SignalId, SignalState>,
}

impl SignalTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signal and returns its handle. The initial value is
    /// all-zeros at the given width.
    pub fn register(&mut self, name: impl Into<String>, width: u32) -> SignalId {
        self.inner.alloc(SignalState::new(name.into(), width))
    }

    /// Looks up a signal's state.
    pub fn state(&self, id: SignalId) -> Result<&SignalState, SimError> {
        self.inner
            .get(id)
            .ok_or(SimError::UnknownSignal { id: id.as_raw() })
    }

    /// Looks up a signal's state mutably.
    pub fn state_mut(&mut self, id: SignalId) -> Result<&mut SignalState, SimError> {
        self.inner
            .get_mut(id)
            .ok_or(SimError::UnknownSignal { id: id.as_raw() })
    }

    /// Finds a signal by name. Names are not required to be unique; the
    /// first registration wins.
    pub fn find(&self, name: &str) -> Option<SignalId> {
        self.inner
            .iter()
            .find(|(_, st)| st.name == name)
            .map(|(id, _)| id)
    }

    /// Number of registered signals.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no signals are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

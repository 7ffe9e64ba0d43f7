//! Time-ordered event queue.
//!
//! Events are ordered by `(time, region, sequence)`. The sequence counter is
//! assigned at insertion, so two events scheduled for the same time and
//! region execute in the order they were scheduled. That tiebreak is what
//! makes runs reproducible regardless of heap internals.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use strobe_common::SimTime;

use crate::process::ProcessId;
use crate::signal::SignalId;

/// Execution region within one simulation instant.
///
/// All `Active` events at an instant run before any `NonBlockingCommit`
/// event, and all commits run before `Postponed` work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Process resumptions and blocking updates.
    Active,
    /// Deferred signal commits.
    NonBlockingCommit,
    /// End-of-instant housekeeping such as log flushing.
    Postponed,
}

/// What a scheduled event does when it reaches the head of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Resume a suspended process. The token must match the process's
    /// current suspension; stale wakeups are discarded.
    Resume {
        /// The process to resume.
        pid: ProcessId,
        /// Suspension token the event was scheduled against.
        token: u64,
    },
    /// Apply the pending non-blocking value of a signal.
    Commit {
        /// The signal whose pending value commits.
        signal: SignalId,
    },
    /// Flush all log sinks for the current instant.
    FlushLogs,
}

/// A scheduled unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Absolute simulation time at which the event fires.
    pub time: SimTime,
    /// Region within the instant.
    pub region: Region,
    /// Insertion order tiebreak.
    pub seq: u64,
    /// The work to perform.
    pub payload: Payload,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then(self.region.cmp(&other.region))
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending events with a monotonic insertion counter.
#[derive(Debug, Default)]
pub struct SchedQueue {
    heap: BinaryHeap<Reverse<Event>>,
    next_seq: u64,
}

impl SchedQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an event at `time` in `region`.
    pub fn schedule(&mut self, time: SimTime, region: Region, payload: Payload) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Event {
            time,
            region,
            seq,
            payload,
        }));
    }

    /// Time of the earliest pending event, if any.
    pub fn next_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(ev)| ev.time)
    }

    /// Borrows the earliest pending event without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|Reverse(ev)| ev)
    }

    /// Removes and returns the earliest pending event.
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(ev)| ev)
    }

    /// Discards all pending events.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

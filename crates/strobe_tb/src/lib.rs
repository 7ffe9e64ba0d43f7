//! Testbench building blocks for the Strobe kernel.
//!
//! Provides the shared [`Scoreboard`] that checkers record into, plus the
//! stock process bodies most benches start from: a free-running
//! [`ClockGen`], a [`StimDriver`] that replays a stimulus source onto a
//! signal, and a [`SampleChecker`] that compares a signal against an
//! expectation stream on clock edges.

#![warn(missing_docs)]

pub mod bodies;
pub mod checker;

pub use bodies::{ClockGen, SampleChecker, StimDriver};
pub use checker::{CheckOutcome, OnMismatch, Scoreboard, Verdict};

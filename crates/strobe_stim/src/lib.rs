//! Stimulus sources for Strobe testbenches.
//!
//! A [`StimulusSource`] is a lazy producer of [`BitVec`](strobe_common::BitVec)
//! values pulled by a driver process. Four variants are provided:
//!
//! - [`Static`]: the same value on every pull (infinite)
//! - [`Sequential`]: an ordered list, exhausted after the last value
//! - [`RandomSeeded`]: a deterministic pseudo-random stream; identical
//!   seeds produce identical sequences
//! - [`FileDriven`]: values parsed from a record file under one of the
//!   [`NumFormat`] numeric formats
//!
//! Exhaustion is signalled as `Ok(None)`; it is the owning process's job to
//! decide whether that is an orderly stop or a fatal missing-stimulus
//! condition.

#![warn(missing_docs)]

pub mod error;
pub mod format;
pub mod source;

pub use error::StimError;
pub use format::NumFormat;
pub use source::{FileDriven, RandomSeeded, Sequential, Static, StimulusSource};

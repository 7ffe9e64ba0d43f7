//! Shared foundational types for the Strobe verification kernel.
//!
//! This crate provides the value and bookkeeping types used across the
//! workspace: packed fixed-width bit vectors, dense typed-ID arenas, and
//! femtosecond-resolution simulation time.

#![warn(missing_docs)]

pub mod arena;
pub mod bitvec;
pub mod time;

pub use arena::{Arena, ArenaId};
pub use bitvec::BitVec;
pub use time::{SimTime, FS_PER_MS, FS_PER_NS, FS_PER_PS, FS_PER_US};

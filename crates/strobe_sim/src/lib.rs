//! Deterministic discrete-event simulation kernel.
//!
//! The kernel executes cooperative processes against a table of two-phase
//! signals under a three-region delta-cycle scheduler. Determinism is the
//! core contract: event ordering is fully specified by `(time, region,
//! insertion order)`, so a scenario replays identically on every run.
//!
//! ```ignore
//! let mut kernel = Kernel::new();
//! let clk = kernel.add_signal("clk", 1);
//! kernel.spawn("clk_gen", Box::new(move |ctx: &mut ProcCtx<'_>| {
//!     let next = if ctx.read(clk)?.is_all_zero() { 1 } else { 0 };
//!     ctx.write_blocking(clk, BitVec::from_u64(next, 1))?;
//!     Ok(Yield::Delay(SimTime::from_ns(5)))
//! }));
//! let summary = kernel.run(Some(SimTime::from_ns(100)))?;
//! ```

#![warn(missing_docs)]

mod error;
mod event;
mod kernel;
mod process;
mod signal;

pub use error::SimError;
pub use event::{Event, Payload, Region, SchedQueue};
pub use kernel::{Kernel, KernelConfig, ProcCtx, RunSummary, StopReason};
pub use process::{GroupId, ProcessBody, ProcessId, WaitKind, Yield};
pub use signal::{SignalId, SignalState, SignalTable};

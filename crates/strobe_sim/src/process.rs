//! Cooperative processes and fork groups.

use serde::{Deserialize, Serialize};
use strobe_common::{ArenaId, SimTime};

use crate::error::SimError;
use crate::kernel::ProcCtx;
use crate::signal::SignalId;

/// Opaque handle to a spawned process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ArenaId for ProcessId {
    fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

/// Opaque handle to a fork group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(u32);

impl ArenaId for GroupId {
    fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

/// What a process does after its current activation.
#[derive(Debug)]
pub enum Yield {
    /// Suspend for a relative delay, then resume.
    Delay(SimTime),
    /// Suspend until any listed signal changes value. Sensitization is
    /// one-shot: it is cleared on wakeup and must be re-requested.
    WaitAny(Vec<SignalId>),
    /// Suspend until every branch of a fork group has completed. Resumes
    /// immediately if the group is already empty.
    Join(GroupId),
    /// End the entire simulation with [`StopReason::Finished`](crate::StopReason::Finished).
    Finish,
    /// This process is complete; the rest of the simulation continues.
    Done,
}

/// A resumable unit of testbench behavior.
///
/// The kernel calls [`resume`](ProcessBody::resume) each time the process is
/// activated; the body performs reads, writes, logging, and forking through
/// the context, then yields its next suspension. Any closure of the matching
/// signature is a body, so stateful processes are typically written as
/// `move` closures over a step counter:
///
/// ```ignore
/// let mut half_periods = 0u32;
/// kernel.spawn("clk_gen", Box::new(move |ctx: &mut ProcCtx<'_>| {
///     half_periods += 1;
///     // toggle, then...
///     Ok(Yield::Delay(SimTime::from_ns(5)))
/// }));
/// ```
pub trait ProcessBody {
    /// Runs the process until its next suspension point.
    ///
    /// Returning `Err` with a value from [`ProcCtx::fatal`] aborts the run
    /// with a fatal stop; any other error surfaces from
    /// [`Kernel::run`](crate::Kernel::run) as a configuration failure.
    fn resume(&mut self, ctx: &mut ProcCtx<'_>) -> Result<Yield, SimError>;
}

impl<F> ProcessBody for F
where
    F: FnMut(&mut ProcCtx<'_>) -> Result<Yield, SimError>,
{
    fn resume(&mut self, ctx: &mut ProcCtx<'_>) -> Result<Yield, SimError> {
        self(ctx)
    }
}

/// Why a suspended process is suspended.
#[derive(Debug)]
pub enum WaitKind {
    /// Sleeping until an absolute time.
    Until(SimTime),
    /// Sensitized to one or more signals.
    OnChange(Vec<SignalId>),
    /// Blocked on a fork group.
    Join(GroupId),
}

/// Lifecycle state of a process.
#[derive(Debug)]
pub enum ProcessState {
    /// Spawned but not yet activated.
    Ready,
    /// Currently executing its body.
    Running,
    /// Waiting as described by the [`WaitKind`].
    Suspended(WaitKind),
    /// Completed; never activated again.
    Finished,
}

/// Kernel-side record of one process.
///
/// The body is held in an `Option` so the kernel can take it out during an
/// activation while lending the process table to the context.
pub(crate) struct Process {
    pub(crate) name: String,
    pub(crate) state: ProcessState,
    pub(crate) body: Option<Box<dyn ProcessBody>>,
    /// Fork group this process is a branch of, if any.
    pub(crate) owner: Option<GroupId>,
    /// Incremented on every suspension. A resume event carrying an older
    /// token is stale and ignored.
    pub(crate) token: u64,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("owner", &self.owner)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Bookkeeping for one `fork`.
#[derive(Debug)]
pub(crate) struct ForkGroup {
    /// Branches not yet finished.
    pub(crate) pending: u32,
    /// Processes blocked in a join on this group.
    pub(crate) joiners: Vec<ProcessId>,
}

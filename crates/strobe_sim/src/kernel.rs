//! The event-driven simulation kernel.
//!
//! One [`Kernel`] owns the event queue, the signal table, the process and
//! fork-group tables, and the logger. [`Kernel::run`] pops events in
//! `(time, region, insertion)` order until the queue drains, a process
//! finishes the simulation, a fatal is raised, or the optional time limit is
//! reached. All scheduling decisions are deterministic, so two runs of the
//! same scenario produce identical transcripts.

use serde::{Deserialize, Serialize};
use strobe_common::{Arena, ArenaId, BitVec, SimTime};
use strobe_log::{Level, LogRecord, LogSink, Logger};

use crate::error::SimError;
use crate::event::{Payload, Region, SchedQueue};
use crate::process::{ForkGroup, Process, ProcessBody, ProcessState, WaitKind, Yield};
use crate::process::{GroupId, ProcessId};
use crate::signal::{SignalId, SignalTable};

/// Tunable limits for a kernel instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Maximum number of events executed at a single instant before the
    /// kernel gives up with [`SimError::DeltaCycleLimit`].
    pub max_deltas_per_step: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_deltas_per_step: 10_000,
        }
    }
}

/// Why a run terminated normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The event queue drained with no process left waiting.
    Exhausted,
    /// A process yielded [`Yield::Finish`].
    Finished,
    /// A process raised a fatal report with the given message.
    Fatal(String),
    /// The caller-supplied time limit was reached.
    TimeLimit,
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Why the run stopped.
    pub stop: StopReason,
    /// Simulation time when the run stopped.
    pub final_time: SimTime,
    /// Total number of commit batches (delta cycles) executed.
    pub total_deltas: u64,
}

/// The simulation kernel.
pub struct Kernel {
    now: SimTime,
    queue: SchedQueue,
    signals: SignalTable,
    procs: Arena<ProcessId, Process>,
    groups: Arena<GroupId, ForkGroup>,
    logger: Logger,
    config: KernelConfig,
    finished: bool,
    total_deltas: u64,
    events_at_now: u32,
    flushed_at: Option<SimTime>,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    /// Creates a kernel with default limits and no log sinks.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Creates a kernel with explicit limits.
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            now: SimTime::zero(),
            queue: SchedQueue::new(),
            signals: SignalTable::new(),
            procs: Arena::new(),
            groups: Arena::new(),
            logger: Logger::new(),
            config,
            finished: false,
            total_deltas: 0,
            events_at_now: 0,
            flushed_at: None,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Attaches a log sink; records are fanned out to every attached sink.
    pub fn attach_sink(&mut self, sink: Box<dyn LogSink>) {
        self.logger.attach(sink);
    }

    /// Borrows the logger, e.g. to inspect the transcript.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Takes the accumulated log transcript.
    pub fn take_transcript(&mut self) -> Vec<LogRecord> {
        self.logger.take_transcript()
    }

    /// Registers a signal with an all-zeros initial value.
    pub fn add_signal(&mut self, name: impl Into<String>, width: u32) -> SignalId {
        self.signals.register(name, width)
    }

    /// Finds a registered signal by name.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals.find(name)
    }

    /// Reads the currently visible value of a signal.
    pub fn signal_value(&self, id: SignalId) -> Result<&BitVec, SimError> {
        Ok(&self.signals.state(id)?.value)
    }

    /// Name of a registered signal.
    pub fn signal_name(&self, id: SignalId) -> Result<&str, SimError> {
        Ok(self.signals.state(id)?.name.as_str())
    }

    /// Number of registered signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Number of spawned processes, finished or not.
    pub fn process_count(&self) -> usize {
        self.procs.len()
    }

    /// Spawns a top-level process. Its first activation is scheduled at the
    /// current time; processes spawned earlier activate first.
    pub fn spawn(&mut self, name: impl Into<String>, body: Box<dyn ProcessBody>) -> ProcessId {
        let pid = self.procs.alloc(Process {
            name: name.into(),
            state: ProcessState::Ready,
            body: Some(body),
            owner: None,
            token: 0,
        });
        self.queue
            .schedule(self.now, Region::Active, Payload::Resume { pid, token: 0 });
        pid
    }

    /// Runs the simulation, optionally up to a time limit.
    ///
    /// Events scheduled exactly at `until` still execute; the run stops when
    /// the next event lies strictly beyond it. Returns the summary on any
    /// normal stop, including process-raised fatals; configuration and
    /// progress errors come back as `Err`.
    pub fn run(&mut self, until: Option<SimTime>) -> Result<RunSummary, SimError> {
        loop {
            let Some(next) = self.queue.next_time() else {
                let waiting = self.waiting_count();
                if waiting > 0 {
                    return Err(SimError::Deadlock {
                        fs: self.now.fs,
                        waiting,
                    });
                }
                return self.finish(StopReason::Exhausted);
            };
            if let Some(limit) = until {
                if next > limit {
                    self.now = limit;
                    self.queue.clear();
                    return self.finish(StopReason::TimeLimit);
                }
            }
            if next != self.now {
                self.events_at_now = 0;
            }
            self.now = next;
            self.events_at_now += 1;
            if self.events_at_now > self.config.max_deltas_per_step {
                return Err(SimError::DeltaCycleLimit {
                    fs: self.now.fs,
                    max_deltas: self.config.max_deltas_per_step,
                });
            }
            if self.flushed_at != Some(self.now) {
                self.flushed_at = Some(self.now);
                self.queue
                    .schedule(self.now, Region::Postponed, Payload::FlushLogs);
            }
            let Some(event) = self.queue.pop() else {
                continue;
            };
            match event.payload {
                Payload::Resume { pid, token } => {
                    match self.execute(pid, token) {
                        Ok(()) => {}
                        Err(SimError::Fatal { message, .. }) => {
                            self.logger.log(self.now, Level::Error, format!("fatal: {message}"));
                            self.queue.clear();
                            return self.finish(StopReason::Fatal(message));
                        }
                        Err(other) => return Err(other),
                    }
                    if self.finished {
                        self.queue.clear();
                        return self.finish(StopReason::Finished);
                    }
                }
                Payload::Commit { signal } => {
                    self.commit_batch(signal)?;
                    self.total_deltas += 1;
                }
                Payload::FlushLogs => self.logger.flush()?,
            }
        }
    }

    fn finish(&mut self, stop: StopReason) -> Result<RunSummary, SimError> {
        self.logger.flush()?;
        Ok(RunSummary {
            stop,
            final_time: self.now,
            total_deltas: self.total_deltas,
        })
    }

    fn waiting_count(&self) -> usize {
        self.procs
            .values()
            .filter(|p| {
                matches!(
                    p.state,
                    ProcessState::Suspended(WaitKind::OnChange(_))
                        | ProcessState::Suspended(WaitKind::Join(_))
                )
            })
            .count()
    }

    /// Activates one process, then reschedules it according to its yield.
    fn execute(&mut self, pid: ProcessId, token: u64) -> Result<(), SimError> {
        let mut body = {
            let Some(proc) = self.procs.get_mut(pid) else {
                return Ok(());
            };
            if proc.token != token {
                return Ok(());
            }
            if matches!(proc.state, ProcessState::Finished | ProcessState::Running) {
                return Ok(());
            }
            let Some(body) = proc.body.take() else {
                return Ok(());
            };
            proc.state = ProcessState::Running;
            body
        };

        let yielded = {
            let mut ctx = ProcCtx {
                now: self.now,
                signals: &mut self.signals,
                queue: &mut self.queue,
                procs: &mut self.procs,
                groups: &mut self.groups,
                logger: &mut self.logger,
            };
            body.resume(&mut ctx)
        };
        let yielded = match yielded {
            Ok(y) => y,
            Err(e) => {
                self.procs[pid].state = ProcessState::Finished;
                return Err(e);
            }
        };

        match yielded {
            Yield::Delay(amount) => {
                let wake_at = self.now + amount;
                let proc = &mut self.procs[pid];
                proc.body = Some(body);
                proc.token += 1;
                proc.state = ProcessState::Suspended(WaitKind::Until(wake_at));
                let token = proc.token;
                self.queue
                    .schedule(wake_at, Region::Active, Payload::Resume { pid, token });
            }
            Yield::WaitAny(sigs) => {
                for &sig in &sigs {
                    if self.signals.state(sig).is_err() {
                        self.procs[pid].state = ProcessState::Finished;
                        return Err(SimError::UnknownSignal { id: sig.as_raw() });
                    }
                }
                let proc = &mut self.procs[pid];
                proc.body = Some(body);
                proc.token += 1;
                proc.state = ProcessState::Suspended(WaitKind::OnChange(sigs.clone()));
                for sig in sigs {
                    self.signals.state_mut(sig)?.sensitized.push(pid);
                }
            }
            Yield::Join(gid) => {
                if !self.groups.contains(gid) {
                    self.procs[pid].state = ProcessState::Finished;
                    return Err(SimError::UnknownGroup { id: gid.as_raw() });
                }
                let proc = &mut self.procs[pid];
                proc.body = Some(body);
                proc.token += 1;
                proc.state = ProcessState::Suspended(WaitKind::Join(gid));
                let token = proc.token;
                let group = &mut self.groups[gid];
                if group.pending == 0 {
                    self.queue
                        .schedule(self.now, Region::Active, Payload::Resume { pid, token });
                } else {
                    group.joiners.push(pid);
                }
            }
            Yield::Finish => {
                self.procs[pid].state = ProcessState::Finished;
                self.finished = true;
            }
            Yield::Done => {
                let owner = {
                    let proc = &mut self.procs[pid];
                    proc.state = ProcessState::Finished;
                    proc.owner
                };
                if let Some(gid) = owner {
                    self.complete_branch(gid);
                }
            }
        }
        Ok(())
    }

    /// Applies every commit pending at the current instant as one batch,
    /// then wakes processes sensitized to the signals that changed. The
    /// batch is atomic: no wakeup observes a half-applied instant.
    fn commit_batch(&mut self, first: SignalId) -> Result<(), SimError> {
        let mut changed = Vec::new();
        self.apply_commit(first, &mut changed)?;
        loop {
            let signal = match self.queue.peek() {
                Some(ev) if ev.time == self.now => match ev.payload {
                    Payload::Commit { signal } => signal,
                    _ => break,
                },
                _ => break,
            };
            self.queue.pop();
            self.apply_commit(signal, &mut changed)?;
        }
        for sig in changed {
            wake_sensitized(
                &mut self.signals,
                &mut self.procs,
                &mut self.queue,
                self.now,
                sig,
            );
        }
        Ok(())
    }

    fn apply_commit(&mut self, sig: SignalId, changed: &mut Vec<SignalId>) -> Result<(), SimError> {
        let st = self.signals.state_mut(sig)?;
        if let Some(value) = st.pending.take() {
            if value != st.value {
                st.value = value;
                changed.push(sig);
            }
        }
        Ok(())
    }

    fn complete_branch(&mut self, gid: GroupId) {
        let group = &mut self.groups[gid];
        group.pending = group.pending.saturating_sub(1);
        if group.pending == 0 {
            let joiners = std::mem::take(&mut group.joiners);
            for pid in joiners {
                let token = self.procs[pid].token;
                self.queue
                    .schedule(self.now, Region::Active, Payload::Resume { pid, token });
            }
        }
    }
}

/// Drains the sensitized list of `sig` and schedules a wakeup for each
/// process in it, removing the process from the lists of any other signals
/// it was also sensitized to.
fn wake_sensitized(
    signals: &mut SignalTable,
    procs: &mut Arena<ProcessId, Process>,
    queue: &mut SchedQueue,
    now: SimTime,
    sig: SignalId,
) {
    let Ok(st) = signals.state_mut(sig) else {
        return;
    };
    let woken = std::mem::take(&mut st.sensitized);
    for pid in woken {
        let Some(proc) = procs.get_mut(pid) else {
            continue;
        };
        let wait_set = match &proc.state {
            ProcessState::Suspended(WaitKind::OnChange(set)) => set.clone(),
            _ => continue,
        };
        let token = proc.token;
        for other in wait_set {
            if other != sig {
                if let Ok(other_st) = signals.state_mut(other) {
                    other_st.sensitized.retain(|p| *p != pid);
                }
            }
        }
        queue.schedule(now, Region::Active, Payload::Resume { pid, token });
    }
}

/// The kernel-provided context a process body runs against.
///
/// All interaction with the simulation during an activation goes through
/// this handle: signal reads and writes, logging, forking child processes,
/// and raising fatals.
pub struct ProcCtx<'a> {
    now: SimTime,
    signals: &'a mut SignalTable,
    queue: &'a mut SchedQueue,
    procs: &'a mut Arena<ProcessId, Process>,
    groups: &'a mut Arena<GroupId, ForkGroup>,
    logger: &'a mut Logger,
}

impl ProcCtx<'_> {
    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Reads the currently visible value of a signal.
    pub fn read(&self, sig: SignalId) -> Result<BitVec, SimError> {
        Ok(self.signals.state(sig)?.value.clone())
    }

    /// Name of a registered signal.
    pub fn signal_name(&self, sig: SignalId) -> Result<String, SimError> {
        Ok(self.signals.state(sig)?.name.clone())
    }

    /// Writes a signal immediately. The new value is visible to every read
    /// in the same instant, and sensitized processes are woken at the
    /// current time if the value actually changed. `value` is resized to
    /// the signal's declared width first.
    pub fn write_blocking(&mut self, sig: SignalId, value: BitVec) -> Result<(), SimError> {
        let changed = {
            let st = self.signals.state_mut(sig)?;
            let value = value.resized(st.width);
            if value != st.value {
                st.value = value;
                true
            } else {
                false
            }
        };
        if changed {
            wake_sensitized(self.signals, self.procs, self.queue, self.now, sig);
        }
        Ok(())
    }

    /// Schedules a deferred write that commits at the end of the current
    /// instant. Reads keep observing the old value until then. The last
    /// non-blocking write to a signal within one instant wins.
    pub fn write_nonblocking(&mut self, sig: SignalId, value: BitVec) -> Result<(), SimError> {
        let st = self.signals.state_mut(sig)?;
        let value = value.resized(st.width);
        let first_write = st.pending.is_none();
        st.pending = Some(value);
        if first_write {
            self.queue.schedule(
                self.now,
                Region::NonBlockingCommit,
                Payload::Commit { signal: sig },
            );
        }
        Ok(())
    }

    /// Spawns one child process per branch and returns the group handle to
    /// join on. Children activate at the current time, in branch order,
    /// after the parent suspends.
    pub fn fork(&mut self, branches: Vec<(String, Box<dyn ProcessBody>)>) -> GroupId {
        let gid = self.groups.alloc(ForkGroup {
            pending: branches.len() as u32,
            joiners: Vec::new(),
        });
        for (name, body) in branches {
            let pid = self.procs.alloc(Process {
                name,
                state: ProcessState::Ready,
                body: Some(body),
                owner: Some(gid),
                token: 0,
            });
            self.queue
                .schedule(self.now, Region::Active, Payload::Resume { pid, token: 0 });
        }
        gid
    }

    /// Logs an informational message at the current simulation time.
    pub fn info(&mut self, message: impl Into<String>) {
        self.logger.info(self.now, message);
    }

    /// Logs a warning at the current simulation time.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.logger.warn(self.now, message);
    }

    /// Logs an error at the current simulation time.
    pub fn error(&mut self, message: impl Into<String>) {
        self.logger.error(self.now, message);
    }

    /// Builds a fatal error stamped with the current time. Return it from
    /// the body to abort the run:
    ///
    /// ```ignore
    /// return Err(ctx.fatal("checker mismatch"));
    /// ```
    pub fn fatal(&self, message: impl Into<String>) -> SimError {
        SimError::Fatal {
            fs: self.now.fs,
            message: message.into(),
        }
    }
}

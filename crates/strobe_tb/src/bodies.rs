//! Stock process bodies: clock generation, stimulus driving, and sampled
//! checking.

use strobe_common::{BitVec, SimTime};
use strobe_sim::{ProcCtx, ProcessBody, SignalId, SimError, Yield};
use strobe_stim::{NumFormat, StimulusSource};

use crate::checker::{CheckOutcome, OnMismatch, Scoreboard, Verdict};

/// Free-running clock: toggles a 1-bit signal every half period with
/// blocking writes. Runs until the simulation ends, so pair it with a time
/// limit or a finishing process.
pub struct ClockGen {
    signal: SignalId,
    half_period: SimTime,
}

impl ClockGen {
    /// Creates a clock toggling `signal` every `half_period`.
    pub fn new(signal: SignalId, half_period: SimTime) -> Self {
        Self {
            signal,
            half_period,
        }
    }
}

impl ProcessBody for ClockGen {
    fn resume(&mut self, ctx: &mut ProcCtx<'_>) -> Result<Yield, SimError> {
        let level = ctx.read(self.signal)?;
        let next = if level.is_all_zero() {
            BitVec::from_u64(1, 1)
        } else {
            BitVec::new(1)
        };
        ctx.write_blocking(self.signal, next)?;
        Ok(Yield::Delay(self.half_period))
    }
}

/// Drives a signal from a stimulus source at a fixed interval.
///
/// Each activation pulls one value, applies it as a non-blocking write, and
/// sleeps for the interval. Source warnings (skipped malformed records and
/// the like) are forwarded to the log. The process completes when the
/// source is exhausted; a source error aborts the run.
pub struct StimDriver {
    signal: SignalId,
    source: Box<dyn StimulusSource>,
    interval: SimTime,
}

impl StimDriver {
    /// Creates a driver applying one value from `source` every `interval`.
    pub fn new(signal: SignalId, source: Box<dyn StimulusSource>, interval: SimTime) -> Self {
        Self {
            signal,
            source,
            interval,
        }
    }
}

impl ProcessBody for StimDriver {
    fn resume(&mut self, ctx: &mut ProcCtx<'_>) -> Result<Yield, SimError> {
        let next = self.source.next_value();
        for warning in self.source.take_warnings() {
            ctx.warn(warning);
        }
        match next {
            Ok(Some(value)) => {
                ctx.write_nonblocking(self.signal, value)?;
                Ok(Yield::Delay(self.interval))
            }
            Ok(None) => Ok(Yield::Done),
            Err(e) => {
                let name = ctx.signal_name(self.signal)?;
                Err(ctx.fatal(format!("stimulus for '{name}' failed: {e}")))
            }
        }
    }
}

/// Samples a signal on each rising edge of a trigger and compares it
/// against an expectation stream.
///
/// Every comparison is recorded on the scoreboard. Mismatches log an error
/// and, under [`OnMismatch::Fatal`], abort the run. The process completes
/// when the expectation stream is exhausted.
pub struct SampleChecker {
    signal: SignalId,
    trigger: SignalId,
    expected: Box<dyn StimulusSource>,
    on_mismatch: OnMismatch,
    scoreboard: Scoreboard,
    format: NumFormat,
    armed: bool,
}

impl SampleChecker {
    /// Creates a checker sampling `signal` on rising edges of `trigger`.
    /// `format` controls how values are rendered in log messages.
    pub fn new(
        signal: SignalId,
        trigger: SignalId,
        expected: Box<dyn StimulusSource>,
        on_mismatch: OnMismatch,
        scoreboard: Scoreboard,
        format: NumFormat,
    ) -> Self {
        Self {
            signal,
            trigger,
            expected,
            on_mismatch,
            scoreboard,
            format,
            armed: false,
        }
    }
}

impl ProcessBody for SampleChecker {
    fn resume(&mut self, ctx: &mut ProcCtx<'_>) -> Result<Yield, SimError> {
        if !self.armed {
            self.armed = true;
            return Ok(Yield::WaitAny(vec![self.trigger]));
        }
        // Sensitization fires on any change; only sample the rising edge.
        if ctx.read(self.trigger)?.is_all_zero() {
            return Ok(Yield::WaitAny(vec![self.trigger]));
        }

        let expected = self.expected.next_value();
        for warning in self.expected.take_warnings() {
            ctx.warn(warning);
        }
        let expected = match expected {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(Yield::Done),
            Err(e) => {
                let name = ctx.signal_name(self.signal)?;
                return Err(ctx.fatal(format!("expectations for '{name}' failed: {e}")));
            }
        };

        let name = ctx.signal_name(self.signal)?;
        let observed = ctx.read(self.signal)?;
        if expected.width() > observed.width() {
            ctx.warn(format!(
                "expectation for '{name}' is {} bits wide, truncating to {}",
                expected.width(),
                observed.width(),
            ));
        }
        let expected = expected.resized(observed.width());
        let verdict = if observed == expected {
            Verdict::Pass
        } else if self.on_mismatch == OnMismatch::Fatal {
            Verdict::Fatal
        } else {
            Verdict::Mismatch
        };
        self.scoreboard.record(CheckOutcome {
            time: ctx.now(),
            signal: name.clone(),
            observed: observed.clone(),
            expected: expected.clone(),
            verdict,
        });
        if verdict != Verdict::Pass {
            let message = format!(
                "mismatch on '{name}': observed {}, expected {}",
                self.format.format_value(&observed),
                self.format.format_value(&expected),
            );
            ctx.error(message.clone());
            if self.on_mismatch == OnMismatch::Fatal {
                return Err(ctx.fatal(message));
            }
        }
        Ok(Yield::WaitAny(vec![self.trigger]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strobe_common::FS_PER_NS;
    use strobe_sim::{Kernel, StopReason};
    use strobe_stim::Sequential;

    fn byte(v: u64) -> BitVec {
        BitVec::from_u64(v, 8)
    }

    fn clocked_bench(
        stim: Vec<BitVec>,
        expect: Vec<BitVec>,
        on_mismatch: OnMismatch,
    ) -> (Kernel, Scoreboard) {
        let mut kernel = Kernel::new();
        let clk = kernel.add_signal("clk", 1);
        let data = kernel.add_signal("data", 8);
        let board = Scoreboard::new();

        kernel.spawn(
            "clk_gen",
            Box::new(ClockGen::new(clk, SimTime::from_ns(5))),
        );
        // Drive a new value each full period, aligned off the falling edge.
        kernel.spawn(
            "driver",
            Box::new(StimDriver::new(
                data,
                Box::new(Sequential::new(stim)),
                SimTime::from_ns(10),
            )),
        );
        kernel.spawn(
            "checker",
            Box::new(SampleChecker::new(
                data,
                clk,
                Box::new(Sequential::new(expect)),
                on_mismatch,
                board.clone(),
                NumFormat::HexLower,
            )),
        );
        (kernel, board)
    }

    #[test]
    fn clock_toggles_at_half_period() {
        let mut kernel = Kernel::new();
        let clk = kernel.add_signal("clk", 1);
        kernel.spawn(
            "clk_gen",
            Box::new(ClockGen::new(clk, SimTime::from_ns(5))),
        );
        let summary = kernel.run(Some(SimTime::from_ns(23))).unwrap();
        assert_eq!(summary.stop, StopReason::TimeLimit);
        // Edges at 0, 5, 10, 15, 20 ns: the last edge drove the clock high.
        assert_eq!(kernel.signal_value(clk).unwrap().to_u64(), Some(1));
    }

    #[test]
    fn driver_applies_values_in_order() {
        let mut kernel = Kernel::new();
        let data = kernel.add_signal("data", 8);
        kernel.spawn(
            "driver",
            Box::new(StimDriver::new(
                data,
                Box::new(Sequential::new(vec![byte(0x11), byte(0x22)])),
                SimTime::from_ns(10),
            )),
        );
        let summary = kernel.run(None).unwrap();
        assert_eq!(summary.stop, StopReason::Exhausted);
        assert_eq!(kernel.signal_value(data).unwrap().to_u64(), Some(0x22));
        assert_eq!(summary.final_time.fs, 20 * FS_PER_NS);
    }

    #[test]
    fn matching_samples_all_pass() {
        let values = vec![byte(0xa0), byte(0xa1), byte(0xa2)];
        let (mut kernel, board) = clocked_bench(
            values.clone(),
            values,
            OnMismatch::Continue,
        );
        kernel.run(Some(SimTime::from_ns(100))).unwrap();
        assert_eq!(board.failed(), 0);
        assert_eq!(board.passed(), 3);
    }

    #[test]
    fn mismatch_continue_records_and_keeps_going() {
        let (mut kernel, board) = clocked_bench(
            vec![byte(1), byte(2), byte(3)],
            vec![byte(1), byte(9), byte(3)],
            OnMismatch::Continue,
        );
        let summary = kernel.run(Some(SimTime::from_ns(100))).unwrap();
        assert_ne!(summary.stop, StopReason::Fatal("".into()));
        assert_eq!(board.len(), 3);
        assert_eq!(board.failed(), 1);
        assert_eq!(kernel.logger().error_count(), 1);
        let outcomes = board.outcomes();
        assert_eq!(outcomes[1].verdict, Verdict::Mismatch);
        assert_eq!(outcomes[1].observed, byte(2));
        assert_eq!(outcomes[1].expected, byte(9));
    }

    #[test]
    fn mismatch_fatal_aborts_run() {
        let (mut kernel, board) = clocked_bench(
            vec![byte(1), byte(2), byte(3)],
            vec![byte(1), byte(9), byte(3)],
            OnMismatch::Fatal,
        );
        let summary = kernel.run(Some(SimTime::from_ns(100))).unwrap();
        match summary.stop {
            StopReason::Fatal(message) => {
                assert!(message.contains("mismatch on 'data'"), "{message}");
                assert!(message.contains("observed 2, expected 9"), "{message}");
            }
            other => panic!("expected fatal stop, got {other:?}"),
        }
        // The failing sample was still recorded before the abort.
        assert_eq!(board.failed(), 1);
    }

    #[test]
    fn over_wide_expectation_truncates_with_warning() {
        use strobe_log::Level;

        // A 9-bit expectation against an 8-bit signal still compares after
        // truncation, but the misconfiguration must show in the transcript.
        let (mut kernel, board) = clocked_bench(
            vec![byte(0xff)],
            vec![BitVec::from_u64(0x1ff, 9)],
            OnMismatch::Continue,
        );
        kernel.run(Some(SimTime::from_ns(40))).unwrap();
        assert_eq!(board.passed(), 1);
        let records = kernel.take_transcript();
        assert!(records.iter().any(|r| {
            r.level == Level::Warn
                && r.message.contains("expectation for 'data' is 9 bits wide")
        }));
    }

    #[test]
    fn checker_samples_rising_edges_only() {
        // Static data with a known value: every sample should pass, and the
        // number of samples equals the number of rising edges seen before
        // the expectation stream ran out.
        let (mut kernel, board) = clocked_bench(
            vec![byte(7); 4],
            vec![byte(7); 4],
            OnMismatch::Continue,
        );
        kernel.run(Some(SimTime::from_ns(200))).unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board.passed(), 4);
    }
}

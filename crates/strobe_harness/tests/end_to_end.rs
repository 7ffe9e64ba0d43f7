//! End-to-end regression scenarios exercising the kernel, stimulus
//! sources, checkers, and runner together.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use strobe_common::{BitVec, SimTime};
use strobe_harness::{RegressionRunner, Scenario, ScenarioVerdict, SuiteConfig};
use strobe_sim::{Kernel, ProcCtx, ProcessBody, StopReason, Yield};
use strobe_stim::{FileDriven, NumFormat, RandomSeeded, Sequential, Static};
use strobe_tb::{ClockGen, OnMismatch, SampleChecker, Scoreboard, StimDriver, Verdict};

fn byte(v: u64) -> BitVec {
    BitVec::from_u64(v, 8)
}

/// Spawns a clock, a process driving `value` onto `q` at 15 ns, and a
/// checker sampling `q` on rising clock edges (the first usable edge is at
/// 20 ns).
fn edge_checked_bench(
    kernel: &mut Kernel,
    board: &Scoreboard,
    value: u64,
    expected: Box<dyn strobe_stim::StimulusSource>,
    policy: OnMismatch,
) {
    let clk = kernel.add_signal("clk", 1);
    let q = kernel.add_signal("q", 8);
    kernel.spawn("clk_gen", Box::new(ClockGen::new(clk, SimTime::from_ns(10))));
    let mut step = 0;
    kernel.spawn(
        "driver",
        Box::new(move |ctx: &mut ProcCtx<'_>| {
            step += 1;
            if step == 1 {
                return Ok(Yield::Delay(SimTime::from_ns(15)));
            }
            ctx.write_blocking(q, byte(value))?;
            Ok(Yield::Done)
        }),
    );
    kernel.spawn(
        "checker",
        Box::new(SampleChecker::new(
            q,
            clk,
            expected,
            policy,
            board.clone(),
            NumFormat::HexLower,
        )),
    );
}

#[test]
fn static_expectation_passes_at_sample_time() {
    let mut runner = RegressionRunner::new(SuiteConfig::default());
    runner.add(
        Scenario::new("static_pass", |kernel, board, _seed| {
            edge_checked_bench(
                kernel,
                board,
                0xff,
                Box::new(Static::new(byte(0xff))),
                OnMismatch::Continue,
            );
            Ok(())
        })
        .with_time_limit(SimTime::from_ns(25)),
    );
    let result = runner.run_suite();
    assert!(result.passed);
    let scenario = &result.results[0];
    assert_eq!(scenario.verdict, ScenarioVerdict::Pass);
    assert_eq!(scenario.outcomes.len(), 1);
    assert_eq!(scenario.outcomes[0].verdict, Verdict::Pass);
    assert_eq!(scenario.outcomes[0].time, SimTime::from_ns(20));
    assert_eq!(scenario.outcomes[0].observed, byte(0xff));
}

#[test]
fn fatal_mismatch_halts_scenario_and_discards_later_events() {
    let late_ran = Rc::new(RefCell::new(false));
    let late_ran_probe = Rc::clone(&late_ran);

    let mut runner = RegressionRunner::new(SuiteConfig::default());
    runner.add(
        Scenario::new("fatal_mismatch", move |kernel, board, _seed| {
            edge_checked_bench(
                kernel,
                board,
                0x01,
                Box::new(Sequential::new(vec![byte(0x02)])),
                OnMismatch::Fatal,
            );
            // Scheduled well after the mismatch at 20 ns; must never run.
            let late_ran = Rc::clone(&late_ran_probe);
            let mut step = 0;
            kernel.spawn(
                "late",
                Box::new(move |_ctx: &mut ProcCtx<'_>| {
                    step += 1;
                    if step == 1 {
                        return Ok(Yield::Delay(SimTime::from_ns(100)));
                    }
                    *late_ran.borrow_mut() = true;
                    Ok(Yield::Done)
                }),
            );
            Ok(())
        })
        .with_time_limit(SimTime::from_ns(500)),
    );

    let result = runner.run_suite();
    assert!(!result.passed);
    assert_eq!(result.failed, vec!["fatal_mismatch".to_string()]);
    let scenario = &result.results[0];
    assert_eq!(scenario.verdict, ScenarioVerdict::Fail);
    assert!(matches!(scenario.stop, Some(StopReason::Fatal(_))));
    assert_eq!(scenario.final_time, SimTime::from_ns(20));
    assert_eq!(scenario.outcomes.len(), 1);
    assert_eq!(scenario.outcomes[0].verdict, Verdict::Fatal);
    assert!(!*late_ran.borrow());
}

#[test]
fn nonblocking_write_read_ordering_across_processes() {
    // One process non-blocking-writes s from 0 to 1 at 10 ns; a second
    // reads s at 10 ns before the commit and must observe 0; a third,
    // sensitized to s, is woken by the commit and must observe 1 at 10 ns.
    let observed = Rc::new(RefCell::new(Vec::new()));
    let observed_probe = Rc::clone(&observed);

    let mut kernel = Kernel::new();
    let s = kernel.add_signal("s", 1);

    let mut step = 0;
    kernel.spawn(
        "writer",
        Box::new(move |ctx: &mut ProcCtx<'_>| {
            step += 1;
            if step == 1 {
                return Ok(Yield::Delay(SimTime::from_ns(10)));
            }
            ctx.write_nonblocking(s, BitVec::from_u64(1, 1))?;
            Ok(Yield::Done)
        }),
    );
    let observed_reader = Rc::clone(&observed);
    let mut step = 0;
    kernel.spawn(
        "reader",
        Box::new(move |ctx: &mut ProcCtx<'_>| {
            step += 1;
            if step == 1 {
                return Ok(Yield::Delay(SimTime::from_ns(10)));
            }
            observed_reader
                .borrow_mut()
                .push(("pre_commit", ctx.now().to_ns(), ctx.read(s)?.to_u64()));
            Ok(Yield::Done)
        }),
    );
    let observed_watcher = Rc::clone(&observed);
    let mut armed = false;
    kernel.spawn(
        "watcher",
        Box::new(move |ctx: &mut ProcCtx<'_>| {
            if !armed {
                armed = true;
                return Ok(Yield::WaitAny(vec![s]));
            }
            observed_watcher
                .borrow_mut()
                .push(("post_commit", ctx.now().to_ns(), ctx.read(s)?.to_u64()));
            Ok(Yield::Done)
        }),
    );

    kernel.run(None).unwrap();
    assert_eq!(
        *observed_probe.borrow(),
        vec![
            ("pre_commit", 10, Some(0)),
            ("post_commit", 10, Some(1)),
        ]
    );
}

#[test]
fn fork_join_blocks_until_all_branches_finish() {
    let joined = Rc::new(RefCell::new(None));
    let joined_probe = Rc::clone(&joined);

    let mut kernel = Kernel::new();
    let joined_inner = Rc::clone(&joined);
    let mut group = None;
    kernel.spawn(
        "parent",
        Box::new(move |ctx: &mut ProcCtx<'_>| match group {
            None => {
                let mut branches: Vec<(String, Box<dyn ProcessBody>)> = Vec::new();
                for delay_ns in [3u64, 30, 12] {
                    let mut step = 0;
                    branches.push((
                        format!("branch_{delay_ns}"),
                        Box::new(move |_ctx: &mut ProcCtx<'_>| {
                            step += 1;
                            if step == 1 {
                                return Ok(Yield::Delay(SimTime::from_ns(delay_ns)));
                            }
                            Ok(Yield::Done)
                        }),
                    ));
                }
                let gid = ctx.fork(branches);
                group = Some(gid);
                Ok(Yield::Join(gid))
            }
            Some(_) => {
                *joined_inner.borrow_mut() = Some(ctx.now().to_ns());
                Ok(Yield::Done)
            }
        }),
    );

    kernel.run(None).unwrap();
    // The slowest branch finishes at 30 ns; joining earlier is a defect.
    assert_eq!(*joined_probe.borrow(), Some(30));
}

#[test]
fn same_seed_produces_byte_identical_results() {
    fn seeded_scenario(seed: u64) -> strobe_harness::ScenarioResult {
        let mut config = SuiteConfig::default();
        config.suite.seed = seed;
        let mut runner = RegressionRunner::new(config);
        runner.add(
            Scenario::new("seeded", |kernel, board, seed| {
                let clk = kernel.add_signal("clk", 1);
                let data = kernel.add_signal("data", 8);
                kernel.spawn("clk_gen", Box::new(ClockGen::new(clk, SimTime::from_ns(5))));
                kernel.spawn(
                    "driver",
                    Box::new(StimDriver::new(
                        data,
                        Box::new(RandomSeeded::new(seed, 8)),
                        SimTime::from_ns(10),
                    )),
                );
                // Expectations replay the identical pseudo-random stream.
                kernel.spawn(
                    "checker",
                    Box::new(SampleChecker::new(
                        data,
                        clk,
                        Box::new(RandomSeeded::new(seed, 8)),
                        OnMismatch::Fatal,
                        board.clone(),
                        NumFormat::HexLower,
                    )),
                );
                Ok(())
            })
            .with_time_limit(SimTime::from_ns(200)),
        );
        let mut result = runner.run_suite();
        assert!(result.passed);
        result.results.remove(0)
    }

    let first = seeded_scenario(0xdead_beef);
    let second = seeded_scenario(0xdead_beef);
    assert!(!first.outcomes.is_empty());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn file_driven_values_drive_in_file_order_then_exhaust() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "a0 a1\na2").unwrap();

    let mut kernel = Kernel::new();
    let data = kernel.add_signal("data", 8);
    let source = FileDriven::open(file.path(), NumFormat::HexLower, 8).unwrap();
    kernel.spawn(
        "driver",
        Box::new(StimDriver::new(
            data,
            Box::new(source),
            SimTime::from_ns(10),
        )),
    );

    let summary = kernel.run(None).unwrap();
    // Exhaustion ends the driver cleanly after the third value.
    assert_eq!(summary.stop, StopReason::Exhausted);
    assert_eq!(summary.final_time, SimTime::from_ns(30));
    assert_eq!(kernel.signal_value(data).unwrap().to_u64(), Some(0xa2));
}

#[test]
fn file_with_no_valid_records_is_fatal() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "zz not-hex !!").unwrap();

    let mut runner = RegressionRunner::new(SuiteConfig::default());
    let path = file.path().to_path_buf();
    runner.add(Scenario::new("empty_stim", move |kernel, _board, _seed| {
        let data = kernel.add_signal("data", 8);
        let source = FileDriven::open(&path, NumFormat::HexLower, 8)
            .map_err(|e| kernel_config_error(e))?;
        kernel.spawn(
            "driver",
            Box::new(StimDriver::new(
                data,
                Box::new(source),
                SimTime::from_ns(10),
            )),
        );
        Ok(())
    }));

    let result = runner.run_suite();
    assert!(!result.passed);
    let scenario = &result.results[0];
    match &scenario.stop {
        Some(StopReason::Fatal(message)) => {
            assert!(message.contains("no valid stimulus records"), "{message}");
        }
        other => panic!("expected fatal stop, got {other:?}"),
    }
}

fn kernel_config_error(e: strobe_stim::StimError) -> strobe_sim::SimError {
    strobe_sim::SimError::Fatal {
        fs: 0,
        message: e.to_string(),
    }
}

#[test]
fn scenarios_are_isolated() {
    // The first scenario drives a signal high; the second registers the
    // same name and must start from zero.
    let second_initial = Rc::new(RefCell::new(None));
    let probe = Rc::clone(&second_initial);

    let mut runner = RegressionRunner::new(SuiteConfig::default());
    runner.add(Scenario::new("writes_high", |kernel, _board, _seed| {
        let s = kernel.add_signal("shared_name", 8);
        kernel.spawn(
            "driver",
            Box::new(move |ctx: &mut ProcCtx<'_>| {
                ctx.write_blocking(s, byte(0xff))?;
                Ok(Yield::Done)
            }),
        );
        Ok(())
    }));
    runner.add(Scenario::new("reads_fresh", move |kernel, _board, _seed| {
        let s = kernel.add_signal("shared_name", 8);
        let probe = Rc::clone(&probe);
        kernel.spawn(
            "reader",
            Box::new(move |ctx: &mut ProcCtx<'_>| {
                *probe.borrow_mut() = ctx.read(s)?.to_u64();
                Ok(Yield::Done)
            }),
        );
        Ok(())
    }));

    let result = runner.run_suite();
    assert!(result.passed);
    assert_eq!(*second_initial.borrow(), Some(0));
}

//! Scenario descriptions and the regression runner.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strobe_common::SimTime;
use strobe_log::{FileSink, Level, LogRecord};
use strobe_sim::{Kernel, SimError, StopReason};
use strobe_tb::{CheckOutcome, Scoreboard, Verdict};

use crate::config::SuiteConfig;

/// Pass/fail classification of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioVerdict {
    /// Every check passed and the run stopped normally.
    Pass,
    /// A check failed, a fatal was raised, or the kernel errored.
    Fail,
}

impl fmt::Display for ScenarioVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioVerdict::Pass => write!(f, "PASS"),
            ScenarioVerdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// Builder callback that populates a fresh kernel with the scenario's
/// signals and processes. Checkers record into the supplied scoreboard,
/// and seeded stimulus sources take the suite-wide seed.
pub type BuildFn = dyn Fn(&mut Kernel, &Scoreboard, u64) -> Result<(), SimError>;

/// One named, isolated simulation run.
pub struct Scenario {
    name: String,
    until: Option<SimTime>,
    build: Box<BuildFn>,
}

impl Scenario {
    /// Creates a scenario with no time limit of its own; the suite default
    /// applies, if any.
    pub fn new(
        name: impl Into<String>,
        build: impl Fn(&mut Kernel, &Scoreboard, u64) -> Result<(), SimError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            until: None,
            build: Box::new(build),
        }
    }

    /// Overrides the suite-wide time limit for this scenario.
    pub fn with_time_limit(mut self, until: SimTime) -> Self {
        self.until = Some(until);
        self
    }

    /// The scenario's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Everything the runner collected from one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name.
    pub name: String,
    /// Pass/fail classification.
    pub verdict: ScenarioVerdict,
    /// Check outcomes in recording order.
    pub outcomes: Vec<CheckOutcome>,
    /// The full ordered log transcript.
    pub records: Vec<LogRecord>,
    /// How the run stopped, or `None` when the kernel errored instead.
    pub stop: Option<StopReason>,
    /// Simulation time when the run ended.
    pub final_time: SimTime,
}

/// Aggregate result of a whole suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Per-scenario results, in execution order.
    pub results: Vec<ScenarioResult>,
    /// Total number of scenarios run.
    pub total: usize,
    /// Names of the scenarios that failed.
    pub failed: Vec<String>,
    /// Overall verdict; `true` only when every scenario passed.
    pub passed: bool,
}

/// Runs a list of scenarios under a shared configuration, each against a
/// fresh kernel. Nothing carries over between scenarios.
pub struct RegressionRunner {
    config: SuiteConfig,
    scenarios: Vec<Scenario>,
}

impl RegressionRunner {
    /// Creates a runner with no scenarios.
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            scenarios: Vec::new(),
        }
    }

    /// Adds a scenario to the end of the run order.
    pub fn add(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    /// Runs every scenario and aggregates the results. A failing scenario
    /// never prevents later scenarios from running.
    pub fn run_suite(self) -> SuiteResult {
        let config = self.config;
        let mut results = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            results.push(run_scenario(&config, scenario));
        }
        let failed: Vec<String> = results
            .iter()
            .filter(|r| r.verdict == ScenarioVerdict::Fail)
            .map(|r| r.name.clone())
            .collect();
        SuiteResult {
            total: results.len(),
            passed: failed.is_empty(),
            failed,
            results,
        }
    }
}

fn run_scenario(config: &SuiteConfig, scenario: &Scenario) -> ScenarioResult {
    let mut kernel = Kernel::with_config(config.kernel_config());
    if let Some(path) = config.suite.log_file.as_deref() {
        match attach_file_sink(&mut kernel, path) {
            Ok(()) => {}
            Err(e) => {
                return failed_result(
                    scenario,
                    &mut kernel,
                    Scoreboard::new(),
                    None,
                    format!("cannot open log file '{}': {e}", path.display()),
                );
            }
        }
    }

    let board = Scoreboard::new();
    if let Err(e) = (scenario.build)(&mut kernel, &board, config.suite.seed) {
        return failed_result(scenario, &mut kernel, board, None, format!("build failed: {e}"));
    }

    let until = scenario.until.or_else(|| config.time_limit());
    match kernel.run(until) {
        Ok(summary) => {
            let outcomes = board.take();
            let clean_checks = outcomes.iter().all(|o| o.verdict == Verdict::Pass);
            let clean_stop = !matches!(summary.stop, StopReason::Fatal(_));
            let verdict = if clean_checks && clean_stop {
                ScenarioVerdict::Pass
            } else {
                ScenarioVerdict::Fail
            };
            ScenarioResult {
                name: scenario.name.clone(),
                verdict,
                outcomes,
                records: kernel.take_transcript(),
                stop: Some(summary.stop),
                final_time: summary.final_time,
            }
        }
        Err(e) => failed_result(scenario, &mut kernel, board, None, e.to_string()),
    }
}

fn attach_file_sink(kernel: &mut Kernel, path: &Path) -> std::io::Result<()> {
    let sink = FileSink::open(path)?;
    kernel.attach_sink(Box::new(sink));
    Ok(())
}

/// Builds a `Fail` result and appends the failure message to the transcript
/// so the error is visible alongside the scenario's own records.
fn failed_result(
    scenario: &Scenario,
    kernel: &mut Kernel,
    board: Scoreboard,
    stop: Option<StopReason>,
    message: String,
) -> ScenarioResult {
    let mut records = kernel.take_transcript();
    records.push(LogRecord {
        time: kernel.now(),
        level: Level::Error,
        message,
    });
    ScenarioResult {
        name: scenario.name.clone(),
        verdict: ScenarioVerdict::Fail,
        outcomes: board.take(),
        records,
        stop,
        final_time: kernel.now(),
    }
}

//! Regression harness for Strobe testbenches.
//!
//! A [`Scenario`] builds a fresh kernel plus its processes and checkers;
//! the [`RegressionRunner`] executes each scenario in isolation under a
//! shared [`SuiteConfig`] (loaded from `strobe.toml`) and aggregates the
//! pass/fail verdicts into a [`SuiteResult`] that CI tooling keys off.

#![warn(missing_docs)]

pub mod config;
pub mod runner;

pub use config::{load_config, load_config_from_str, ConfigError, SuiteConfig, SuiteSection};
pub use runner::{RegressionRunner, Scenario, ScenarioResult, ScenarioVerdict, SuiteResult};

//! Command-line interface for the jury.
//!
//! Provides commands to start cases, advance debate stages, inspect
//! history, rate verdicts and export reports.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};

//! Scenario runner for the TL-UL bus-functional model.

use anyhow as _;
use clap as _;
#[cfg(test)]
use tempfile as _;

/// Scenario settings.
pub mod config;
/// Bench error type.
pub mod errors;
/// Stderr `log` backend.
pub mod logger;
/// Memory and UART scenarios with their run report.
pub mod scenario;
/// VCD waveform output.
pub mod vcd;

pub use config::{BenchConfig, UartBenchConfig, DEFAULT_SEED};
pub use errors::BenchError;
pub use scenario::{run_memory, run_uart, Outcome, RunReport, Scenario};
pub use vcd::{NoProbe, SignalProbe, VcdWriter};

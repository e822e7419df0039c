//! CLI entry point for the TL-UL bench binary.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use env_logger as _;
use log as _;
use rand as _;
use serde as _;
use thiserror as _;
#[cfg(test)]
use tempfile as _;

use tlul_bench::{
    logger, run_memory, run_uart, BenchConfig, BenchError, NoProbe, RunReport, Scenario,
    UartBenchConfig, VcdWriter, DEFAULT_SEED,
};
use tlul_bfm::{BfmConfig, MemorySlaveConfig, PartialWritePolicy, SimTime, UartConfig};

#[derive(Debug, Parser)]
#[command(
    name = "tlul-bench",
    version,
    about = "Drive a TL-UL device through the bus-functional model"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Write a JSON run report to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fill a memory slave with random data and read it back
    Memory {
        /// Seed of the random memory image
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Simulation time limit in half-cycles
        #[arg(long, default_value_t = 1_000_000)]
        max_time: u64,
        /// Memory size in bytes
        #[arg(long, default_value_t = 256)]
        size: usize,
        /// Extra rising edges before each response
        #[arg(long, default_value_t = 0)]
        latency: u32,
        /// Read back in 4-byte halves
        #[arg(long)]
        half_words: bool,
        /// Drive PutPartialData instead of leaving it inert
        #[arg(long)]
        execute_partial: bool,
        /// Dump the bus as a VCD waveform to this path
        #[arg(long)]
        vcd: Option<PathBuf>,
    },
    /// Loop text through a UART sender and receiver
    Uart {
        /// Text to send
        #[arg(long, default_value = "Hello, TL-UL!\n")]
        text: String,
        /// Active clock edges per bit
        #[arg(long, default_value_t = 2)]
        clocks_per_bit: usize,
        /// Simulation time limit in half-cycles
        #[arg(long, default_value_t = 100_000)]
        max_time: u64,
    },
}

fn run_memory_command(config: &BenchConfig, vcd: Option<&Path>) -> Result<RunReport, BenchError> {
    let Some(path) = vcd else {
        return run_memory(config, &mut NoProbe);
    };
    let file = BufWriter::new(File::create(path)?);
    let mut writer = VcdWriter::new(file, u64::BITS)?;
    let report = run_memory(config, &mut writer);
    writer.finish()?;
    report
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json + "\n")
        .with_context(|| format!("failed to write report {}", path.display()))
}

fn run(cli: Cli) -> Result<RunReport> {
    let (scenario, seed, result) = match cli.command {
        Commands::Memory {
            seed,
            max_time,
            size,
            latency,
            half_words,
            execute_partial,
            vcd,
        } => {
            let config = BenchConfig {
                seed,
                max_time: SimTime(max_time),
                half_words,
                memory: MemorySlaveConfig {
                    size_bytes: size,
                    response_latency: latency,
                },
                bfm: BfmConfig {
                    partial_writes: if execute_partial {
                        PartialWritePolicy::Execute
                    } else {
                        PartialWritePolicy::Inert
                    },
                },
            };
            let result = run_memory_command(&config, vcd.as_deref());
            (Scenario::Memory, Some(seed), result)
        }
        Commands::Uart {
            text,
            clocks_per_bit,
            max_time,
        } => {
            let config = UartBenchConfig {
                text,
                uart: UartConfig { clocks_per_bit },
                max_time: SimTime(max_time),
            };
            (Scenario::Uart, None, run_uart(&config))
        }
    };

    let report = match &result {
        Ok(report) => report.clone(),
        Err(error) => RunReport::failed(scenario, seed, error),
    };
    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }
    Ok(result?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = logger::init(cli.verbose) {
        eprintln!("warning: {error}");
    }

    match run(cli) {
        Ok(report) => {
            println!(
                "{:?} passed: {} operations, {} bytes, t={}",
                report.scenario, report.operations, report.bytes, report.final_time
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn parses_memory_defaults() {
        let cli = Cli::try_parse_from(["tlul-bench", "memory"]).expect("valid args");
        assert_eq!(cli.verbose, 0);
        assert!(cli.report.is_none());
        let Commands::Memory {
            seed,
            size,
            half_words,
            vcd,
            ..
        } = cli.command
        else {
            panic!("expected memory command");
        };
        assert_eq!(seed, 0x5EED);
        assert_eq!(size, 256);
        assert!(!half_words);
        assert!(vcd.is_none());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "tlul-bench",
            "uart",
            "--text",
            "abc",
            "--clocks-per-bit",
            "4",
            "-vv",
            "--report",
            "out.json",
        ])
        .expect("valid args");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.report.as_deref(), Some(std::path::Path::new("out.json")));
        assert!(matches!(
            cli.command,
            Commands::Uart {
                ref text,
                clocks_per_bit: 4,
                ..
            } if text == "abc"
        ));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["tlul-bench", "assemble"]).is_err());
    }
}

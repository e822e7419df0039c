//! Bench scenarios and their run report.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tlul_bfm::{
    Completion, Harness, MemorySlave, PartialWritePolicy, RunStop, SimModel, SimTime, TraceEvent,
    UartReceiver, UartSender,
};

use crate::config::{BenchConfig, UartBenchConfig};
use crate::errors::BenchError;
use crate::vcd::SignalProbe;

const WORD_BYTES: usize = 8;

/// Scenario a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Memory fill and read-back over TL-UL.
    Memory,
    /// UART sender/receiver loopback.
    Uart,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Every check held.
    Passed,
    /// The run failed.
    Failed {
        /// Rendered error.
        reason: String,
    },
}

/// Summary written by `--report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario that ran.
    pub scenario: Scenario,
    /// Seed of the memory image, if the scenario uses one.
    pub seed: Option<u64>,
    /// Completed bus operations, or bytes received for the UART.
    pub operations: usize,
    /// Payload bytes moved.
    pub bytes: usize,
    /// Simulation time at the end of the run.
    pub final_time: SimTime,
    /// Result of the run.
    pub outcome: Outcome,
}

impl RunReport {
    /// Report of a run that failed with `error`.
    #[must_use]
    pub fn failed(scenario: Scenario, seed: Option<u64>, error: &BenchError) -> Self {
        Self {
            scenario,
            seed,
            operations: 0,
            bytes: 0,
            final_time: SimTime::default(),
            outcome: Outcome::Failed {
                reason: error.to_string(),
            },
        }
    }

    /// Returns `true` when the run passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }
}

/// Fills a memory slave with seeded random bytes through `PutFullData`,
/// reads it back through `Get` and compares.
///
/// When partial writes are executed, one random byte of every word is
/// patched with `PutPartialData` before the read-back.
///
/// # Errors
///
/// Returns the first fault, time-out, mismatch or probe failure.
pub fn run_memory(
    config: &BenchConfig,
    probe: &mut dyn SignalProbe,
) -> Result<RunReport, BenchError> {
    let slave = MemorySlave::<u64>::new(config.memory);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut image: Vec<u8> = (0..slave.memory().len()).map(|_| rng.random()).collect();
    let mut harness = Harness::new(slave, config.bfm);

    let mut writes = Vec::new();
    for (address, chunk) in (0..).step_by(WORD_BYTES).zip(image.chunks(WORD_BYTES)) {
        writes.push(harness.bfm_mut().submit_write_full(address, 3, 0xFF, chunk));
    }
    if config.bfm.partial_writes == PartialWritePolicy::Execute {
        for word in (0..image.len()).step_by(WORD_BYTES) {
            let lane = rng.random_range(0..WORD_BYTES);
            let value: u8 = rng.random();
            image[word + lane] = value;
            writes.push(harness.bfm_mut().submit_write_partial(
                (word + lane) as u64,
                0,
                1 << lane,
                [value],
            ));
        }
    }
    let mut reads: Vec<(u64, Completion<Vec<u8>>)> = Vec::new();
    for address in (0..image.len() as u64).step_by(WORD_BYTES) {
        let bfm = harness.bfm_mut();
        if config.half_words {
            reads.push((address, bfm.submit_read(address, 2, 0x0F)));
            reads.push((address + 4, bfm.submit_read(address + 4, 2, 0xF0)));
        } else {
            reads.push((address, bfm.submit_read(address, 3, 0xFF)));
        }
    }
    info!(
        "memory scenario: {} writes, {} reads over {} bytes (seed {:#x})",
        writes.len(),
        reads.len(),
        image.len(),
        config.seed
    );

    let mut events = Vec::new();
    probe.sample(harness.time(), harness.model().signals())?;
    while !harness.bfm().is_idle() && harness.time() < config.max_time {
        harness.half_cycle_traced(&mut events)?;
        probe.sample(harness.time(), harness.model().signals())?;
    }
    if !harness.bfm().is_idle() {
        return Err(BenchError::Stopped {
            stop: RunStop::TimeLimit,
            time: harness.time(),
        });
    }

    for write in writes {
        let id = write.id();
        write.into_result().ok_or(BenchError::Incomplete(id))?;
    }
    for (address, read) in reads {
        let id = read.id();
        let data = read.into_result().ok_or(BenchError::Incomplete(id))?;
        compare(&image, address, &data)?;
    }

    let completed = events
        .iter()
        .filter(|event| matches!(event, TraceEvent::Completed { .. }))
        .count();
    debug!("memory scenario finished at t={}", harness.time());
    Ok(RunReport {
        scenario: Scenario::Memory,
        seed: Some(config.seed),
        operations: completed,
        bytes: image.len(),
        final_time: harness.time(),
        outcome: Outcome::Passed,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn compare(image: &[u8], address: u64, data: &[u8]) -> Result<(), BenchError> {
    let start = (address % (image.len() as u64)) as usize;
    let expected = &image[start..start + data.len()];
    for ((offset, &written), &observed) in (0..).zip(expected).zip(data) {
        if written != observed {
            return Err(BenchError::Mismatch {
                address: address + offset,
                expected: written,
                observed,
            });
        }
    }
    Ok(())
}

/// Sends `config.text` from a [`UartSender`] to a [`UartReceiver`] on a
/// shared line and checks the received bytes.
///
/// # Errors
///
/// Returns configuration errors and [`BenchError::UartMismatch`].
pub fn run_uart(config: &UartBenchConfig) -> Result<RunReport, BenchError> {
    let mut sender = UartSender::new(config.uart)?;
    let mut receiver = UartReceiver::new(config.uart)?;
    let sent = config.text.as_bytes();
    sender.write_bytes(sent)?;

    let mut time = SimTime::default();
    let mut clk = true;
    let mut line = true;
    let mut received = Vec::with_capacity(sent.len());
    while (sender.is_busy() || received.len() < sent.len()) && time < config.max_time {
        time = time.next();
        clk = !clk;
        sender.eval(clk, &mut line);
        if let Some(byte) = receiver.eval(clk, line) {
            debug!("t={time}: uart received {byte:#04x}");
            received.push(byte);
        }
    }

    if received != sent {
        return Err(BenchError::UartMismatch {
            sent: config.text.clone(),
            received: String::from_utf8_lossy(&received).into_owned(),
        });
    }
    info!("uart loopback delivered {} bytes by t={time}", received.len());
    Ok(RunReport {
        scenario: Scenario::Uart,
        seed: None,
        operations: received.len(),
        bytes: received.len(),
        final_time: time,
        outcome: Outcome::Passed,
    })
}

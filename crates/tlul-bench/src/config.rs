//! Scenario configuration.

use serde::{Deserialize, Serialize};
use tlul_bfm::{BfmConfig, MemorySlaveConfig, SimTime, UartConfig};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Settings of the memory fill-and-readback scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Seed of the random memory image.
    pub seed: u64,
    /// Simulation time limit in half-cycles.
    pub max_time: SimTime,
    /// Read back in 4-byte halves instead of full words.
    pub half_words: bool,
    /// Device under test.
    pub memory: MemorySlaveConfig,
    /// Bus-functional model settings.
    pub bfm: BfmConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_time: SimTime(1_000_000),
            half_words: false,
            memory: MemorySlaveConfig::default(),
            bfm: BfmConfig::default(),
        }
    }
}

/// Settings of the UART loopback scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UartBenchConfig {
    /// Text sent over the line.
    pub text: String,
    /// Line timing.
    pub uart: UartConfig,
    /// Simulation time limit in half-cycles.
    pub max_time: SimTime,
}

impl Default for UartBenchConfig {
    fn default() -> Self {
        Self {
            text: String::from("Hello, TL-UL!\n"),
            uart: UartConfig::default(),
            max_time: SimTime(100_000),
        }
    }
}

//! 8N1 UART line models driven from the simulation clock.
//!
//! Both sides count active (clock-high) evaluations; one bit lasts
//! `clocks_per_bit` of them. Bytes go out least-significant bit first.

use thiserror::Error;

/// Transmitting side.
pub mod sender;
pub use sender::UartSender;

/// Receiving side.
pub mod receiver;
pub use receiver::UartReceiver;

const DEFAULT_CLOCKS_PER_BIT: usize = 2;

/// Line timing shared by sender and receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UartConfig {
    /// Active clock edges per bit.
    pub clocks_per_bit: usize,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            clocks_per_bit: DEFAULT_CLOCKS_PER_BIT,
        }
    }
}

impl UartConfig {
    fn validate(self) -> Result<usize, UartError> {
        if self.clocks_per_bit == 0 {
            Err(UartError::ZeroClocksPerBit)
        } else {
            Ok(self.clocks_per_bit)
        }
    }
}

/// UART setup and usage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum UartError {
    /// A bit must last at least one clock.
    #[error("clocks_per_bit must be non-zero")]
    ZeroClocksPerBit,
    /// The sender is still shifting out an earlier byte.
    #[error("sender is busy")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LineState {
    #[default]
    Idle,
    StartBit,
    DataBits,
    StopBit,
    Cleanup,
}

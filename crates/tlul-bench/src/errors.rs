//! Bench error type.

use std::io;

use thiserror::Error;
use tlul_bfm::{BfmError, OperationId, RunStop, SimTime, UartError};

/// Anything that makes a scenario fail.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The bus-functional model latched a fault.
    #[error(transparent)]
    Bfm(#[from] BfmError),
    /// UART setup failed.
    #[error(transparent)]
    Uart(#[from] UartError),
    /// Writing the waveform or report failed.
    #[error("i/o failure")]
    Io(#[from] io::Error),
    /// Report serialization failed.
    #[error("report serialization failed")]
    Report(#[from] serde_json::Error),
    /// The run ended before every operation completed.
    #[error("run stopped at t={time} ({stop:?}) with operations pending")]
    Stopped {
        /// Why the run stopped.
        stop: RunStop,
        /// Simulation time at the stop.
        time: SimTime,
    },
    /// An operation reported neither data nor a fault.
    #[error("operation {0} did not complete")]
    Incomplete(OperationId),
    /// Read-back data differs from what was written.
    #[error("mismatch at {address:#06x}: wrote {expected:#04x}, read {observed:#04x}")]
    Mismatch {
        /// Byte address.
        address: u64,
        /// Byte written.
        expected: u8,
        /// Byte read back.
        observed: u8,
    },
    /// The UART receiver produced different bytes than were sent.
    #[error("uart loopback received {received:?}, sent {sent:?}")]
    UartMismatch {
        /// Text sent.
        sent: String,
        /// Text received, lossily decoded.
        received: String,
    },
}

//! Bus-functional model for a TileLink Uncached Lightweight (TL-UL) slave
//! port of a cycle-evaluated device.

/// Bit, byte and lane helpers over bus data words.
pub mod codec;
pub use codec::{
    get_bit, get_byte, lane_mask, pack_lanes, set_bit, set_byte, unpack_lanes, BusWord,
};

/// Byte-enable mask legality rules.
pub mod mask;
pub use mask::{
    classify_mask, is_contiguous_mask, is_legal_mask, transfer_bytes, validate_transfer_mask,
    MaskError,
};

/// Fault taxonomy for caller mistakes and device misbehavior.
pub mod fault;
pub use fault::{BfmError, FaultClass, PreconditionViolation, ProtocolViolation, ResponseField};

/// Public contracts between model, device and driver.
pub mod api;
pub use api::{
    BfmConfig, BusSignals, NoopTrace, PartialWritePolicy, SimModel, SimTime, StepOutcome,
    TraceEvent, TraceSink, SOURCE_ID,
};

/// Operation kinds, opcodes and completion handles.
pub mod op;
pub use op::{
    Completion, Operation, OperationId, OperationKind, ReadOp, Request, RequestOpcode,
    ResponseOpcode, WriteOp,
};

/// FIFO of submitted operations.
pub mod queue;
pub use queue::OperationQueue;

/// TL-UL request/response state machine.
pub mod machine;
pub use machine::{Bfm, Phase};

/// Clock and simulation-time driver.
pub mod harness;
pub use harness::{Harness, RunStop};

/// Reference devices.
pub mod peripherals;
pub use peripherals::{MemorySlave, MemorySlaveConfig};

/// 8N1 UART line models.
pub mod uart;
pub use uart::{UartConfig, UartError, UartReceiver, UartSender};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;

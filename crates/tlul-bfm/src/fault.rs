use thiserror::Error;

use crate::api::SimTime;
use crate::mask::MaskError;
use crate::op::OperationId;

/// Fault classes used to separate caller mistakes from device misbehavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// The submitted operation could never be driven legally.
    Precondition,
    /// The device-under-test answered outside the protocol contract.
    Protocol,
}

/// Caller-side contract breach detected when an operation is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PreconditionViolation {
    /// Mask lane count differs from the `2^size_log2` transfer size.
    #[error("mask {mask:#x} selects {selected} lanes, size_log2 {size_log2} requires 2^{size_log2}")]
    MaskSizeMismatch {
        /// Offending mask.
        mask: u64,
        /// Requested transfer size exponent.
        size_log2: u8,
        /// Number of lanes the mask selects.
        selected: u32,
    },
    /// Mask shape is not a legal byte-enable.
    #[error("illegal mask {mask:#x}: {reason}")]
    IllegalMask {
        /// Offending mask.
        mask: u64,
        /// Why the mask is illegal.
        reason: MaskError,
    },
    /// Write payload length differs from the transfer size.
    #[error("payload of {observed} bytes, transfer size requires {expected}")]
    PayloadLength {
        /// Transfer size in bytes.
        expected: usize,
        /// Supplied payload length.
        observed: usize,
    },
    /// Transfer is wider than the data bus.
    #[error("transfer of 2^{size_log2} bytes exceeds the {lanes}-lane data bus")]
    TransferTooWide {
        /// Requested transfer size exponent.
        size_log2: u8,
        /// Lane count of the data bus.
        lanes: u32,
    },
    /// Partial-write mask selects lanes outside the addressed span.
    #[error("partial mask {mask:#x} is empty or leaves the addressed span {span:#x}")]
    PartialMaskOutsideSpan {
        /// Offending mask.
        mask: u64,
        /// Lanes of the naturally aligned span holding the address.
        span: u64,
    },
}

/// Channel D field checked when a response is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ResponseField {
    /// `d_opcode`.
    Opcode,
    /// `d_param`.
    Param,
    /// `d_size`.
    Size,
    /// `d_source`.
    Source,
}

impl ResponseField {
    /// Signal name as it appears on the device port.
    #[must_use]
    pub const fn signal_name(self) -> &'static str {
        match self {
            Self::Opcode => "d_opcode",
            Self::Param => "d_param",
            Self::Size => "d_size",
            Self::Source => "d_source",
        }
    }
}

/// Device-side contract breach observed on channel D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("{}: expected {expected}, observed {observed}", .field.signal_name())]
pub struct ProtocolViolation {
    /// Field that disagreed with the request.
    pub field: ResponseField,
    /// Value the request implies.
    pub expected: u8,
    /// Value sampled from the bus.
    pub observed: u8,
}

/// Fatal error raised by the bus-functional model.
///
/// The first error latches: every later step reports it again and the
/// model is no longer driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BfmError {
    /// Operation failed validation at dispatch, before any signal was driven.
    #[error("operation {id} rejected at t={time}: {violation}")]
    Precondition {
        /// Operation being dispatched.
        id: OperationId,
        /// Simulation time of the dispatch attempt.
        time: SimTime,
        /// Violated precondition.
        violation: PreconditionViolation,
    },
    /// Response of the active operation broke the protocol.
    #[error("protocol violation in operation {id} at t={time}: {violation}")]
    Protocol {
        /// Operation awaiting the response.
        id: OperationId,
        /// Simulation time of the sampled response.
        time: SimTime,
        /// Mismatching response field.
        violation: ProtocolViolation,
    },
}

impl BfmError {
    /// Returns the fault class of this error.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::Precondition { .. } => FaultClass::Precondition,
            Self::Protocol { .. } => FaultClass::Protocol,
        }
    }

    /// Returns the operation the error was raised for.
    #[must_use]
    pub const fn operation(&self) -> OperationId {
        match self {
            Self::Precondition { id, .. } | Self::Protocol { id, .. } => *id,
        }
    }

    /// Returns the simulation time at which the error was raised.
    #[must_use]
    pub const fn time(&self) -> SimTime {
        match self {
            Self::Precondition { time, .. } | Self::Protocol { time, .. } => *time,
        }
    }
}

//! Operation model: the three TL-UL request kinds and their completions.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Channel A opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum RequestOpcode {
    /// Full-width write of every lane in the mask.
    PutFullData = 0,
    /// Write of a subset of lanes.
    PutPartialData = 1,
    /// Read.
    Get = 4,
}

impl RequestOpcode {
    /// Wire value of the opcode.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a wire value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::PutFullData),
            1 => Some(Self::PutPartialData),
            4 => Some(Self::Get),
            _ => None,
        }
    }

    /// Response opcode a compliant device answers with.
    #[must_use]
    pub const fn expected_response(self) -> ResponseOpcode {
        match self {
            Self::Get => ResponseOpcode::AccessAckData,
            Self::PutFullData | Self::PutPartialData => ResponseOpcode::AccessAck,
        }
    }
}

/// Channel D opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum ResponseOpcode {
    /// Write acknowledgement without data.
    AccessAck = 0,
    /// Read acknowledgement carrying data.
    AccessAckData = 1,
}

impl ResponseOpcode {
    /// Wire value of the opcode.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a wire value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::AccessAck),
            1 => Some(Self::AccessAckData),
            _ => None,
        }
    }
}

/// Identifier assigned to an operation at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct OperationId(u64);

impl OperationId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperationKind {
    /// `Get`.
    Read,
    /// `PutFullData`.
    WriteFull,
    /// `PutPartialData`.
    WritePartial,
}

impl OperationKind {
    /// Channel A opcode used for this kind.
    #[must_use]
    pub const fn opcode(self) -> RequestOpcode {
        match self {
            Self::Read => RequestOpcode::Get,
            Self::WriteFull => RequestOpcode::PutFullData,
            Self::WritePartial => RequestOpcode::PutPartialData,
        }
    }
}

/// Address, size and byte-enable shared by every request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Request {
    /// Byte address.
    pub address: u64,
    /// Transfer size exponent; `2^size_log2` bytes move.
    pub size_log2: u8,
    /// Byte-enable mask, one bit per data lane.
    pub mask: u64,
}

/// Queued `Get`.
#[derive(Debug)]
pub struct ReadOp {
    pub(crate) id: OperationId,
    pub(crate) request: Request,
    pub(crate) reply: Sender<Vec<u8>>,
}

/// Queued `PutFullData` or `PutPartialData`.
#[derive(Debug)]
pub struct WriteOp {
    pub(crate) id: OperationId,
    pub(crate) request: Request,
    pub(crate) payload: Vec<u8>,
    pub(crate) reply: Sender<()>,
}

/// One queued bus operation.
#[derive(Debug)]
pub enum Operation {
    /// Read `2^size_log2` bytes.
    Read(ReadOp),
    /// Write `2^size_log2` bytes to every masked lane.
    WriteFull(WriteOp),
    /// Write a subset of lanes; see [`crate::PartialWritePolicy`].
    WritePartial(WriteOp),
}

impl Operation {
    /// Creates a read and the handle receiving its data.
    #[must_use]
    pub fn read(id: OperationId, request: Request) -> (Self, Completion<Vec<u8>>) {
        let (reply, completion) = Completion::channel(id);
        (Self::Read(ReadOp { id, request, reply }), completion)
    }

    /// Creates a full write and the handle signalling its acknowledgement.
    #[must_use]
    pub fn write_full(
        id: OperationId,
        request: Request,
        payload: Vec<u8>,
    ) -> (Self, Completion<()>) {
        let (reply, completion) = Completion::channel(id);
        let op = WriteOp {
            id,
            request,
            payload,
            reply,
        };
        (Self::WriteFull(op), completion)
    }

    /// Creates a partial write and the handle signalling its acknowledgement.
    #[must_use]
    pub fn write_partial(
        id: OperationId,
        request: Request,
        payload: Vec<u8>,
    ) -> (Self, Completion<()>) {
        let (reply, completion) = Completion::channel(id);
        let op = WriteOp {
            id,
            request,
            payload,
            reply,
        };
        (Self::WritePartial(op), completion)
    }

    /// Identifier assigned at submission.
    #[must_use]
    pub const fn id(&self) -> OperationId {
        match self {
            Self::Read(op) => op.id,
            Self::WriteFull(op) | Self::WritePartial(op) => op.id,
        }
    }

    /// Operation kind.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Read(_) => OperationKind::Read,
            Self::WriteFull(_) => OperationKind::WriteFull,
            Self::WritePartial(_) => OperationKind::WritePartial,
        }
    }

    /// Address, size and mask of the request.
    #[must_use]
    pub const fn request(&self) -> &Request {
        match self {
            Self::Read(op) => &op.request,
            Self::WriteFull(op) | Self::WritePartial(op) => &op.request,
        }
    }
}

/// Handle to the result of a submitted operation.
///
/// The model delivers the result once the response has been checked. If
/// the run faults first, the operation is discarded and the handle reports
/// it as abandoned.
#[derive(Debug)]
pub struct Completion<T> {
    id: OperationId,
    rx: Receiver<T>,
    value: Option<T>,
    abandoned: bool,
}

impl<T> Completion<T> {
    fn channel(id: OperationId) -> (Sender<T>, Self) {
        let (tx, rx) = mpsc::channel();
        let completion = Self {
            id,
            rx,
            value: None,
            abandoned: false,
        };
        (tx, completion)
    }

    /// Identifier of the operation this handle belongs to.
    #[must_use]
    pub const fn id(&self) -> OperationId {
        self.id
    }

    fn refresh(&mut self) {
        if self.value.is_some() || self.abandoned {
            return;
        }
        match self.rx.try_recv() {
            Ok(value) => self.value = Some(value),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.abandoned = true,
        }
    }

    /// Returns the result once the operation has completed.
    pub fn poll(&mut self) -> Option<&T> {
        self.refresh();
        self.value.as_ref()
    }

    /// Returns `true` once the operation has completed.
    pub fn is_complete(&mut self) -> bool {
        self.poll().is_some()
    }

    /// Returns `true` when the operation was discarded without completing.
    pub fn is_abandoned(&mut self) -> bool {
        self.refresh();
        self.abandoned
    }

    /// Consumes the handle, returning the result if the operation completed.
    #[must_use]
    pub fn into_result(mut self) -> Option<T> {
        self.refresh();
        self.value
    }
}

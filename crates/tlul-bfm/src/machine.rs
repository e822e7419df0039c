//! TL-UL protocol state machine.
//!
//! Every step is split around a single [`SimModel::eval`] call:
//!
//! 1. While the clock is high, sample channel D / `a_ready` and decide
//!    whether the active operation advances. Accepted responses are checked
//!    and their completion is delivered here.
//! 2. Evaluate the device.
//! 3. While the clock is high and the operation advances, drive the next
//!    request-side signal values.
//!
//! Only the head of the queue is ever in flight.

use log::{debug, error, trace};

use crate::api::{
    BfmConfig, BusSignals, NoopTrace, PartialWritePolicy, SimModel, SimTime, StepOutcome,
    TraceEvent, TraceSink, SOURCE_ID,
};
use crate::codec::{lane_mask, pack_lanes, set_byte, unpack_lanes, BusWord};
use crate::fault::{BfmError, PreconditionViolation, ProtocolViolation, ResponseField};
use crate::mask::{transfer_bytes, validate_transfer_mask};
use crate::op::{Completion, Operation, OperationId, Request, WriteOp};
use crate::queue::OperationQueue;

/// Per-operation protocol phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Phase {
    /// Nothing driven yet; the head operation dispatches on the next edge.
    #[default]
    Idle,
    /// Request asserted, waiting for `a_ready`.
    AwaitRequestAccepted,
    /// Request accepted, `d_ready` asserted, waiting for `d_valid`.
    AwaitResponseValid,
}

/// Bus-functional model for one TL-UL host port.
#[derive(Debug, Default)]
pub struct Bfm {
    config: BfmConfig,
    queue: OperationQueue,
    phase: Phase,
    next_id: u64,
    latched: Option<BfmError>,
}

impl Bfm {
    /// Creates an idle model.
    #[must_use]
    pub const fn new(config: BfmConfig) -> Self {
        Self {
            config,
            queue: OperationQueue::new(),
            phase: Phase::Idle,
            next_id: 0,
            latched: None,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &BfmConfig {
        &self.config
    }

    /// Phase of the active operation.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Operation currently at the head of the queue.
    #[must_use]
    pub fn active(&self) -> Option<OperationId> {
        self.queue.front().map(Operation::id)
    }

    /// Number of operations not yet completed, including the active one.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Identifiers of queued operations in dispatch order.
    pub fn pending_ids(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.queue.pending_ids()
    }

    /// Returns `true` when no operation is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Fault that stopped the model, if any.
    #[must_use]
    pub const fn latched_fault(&self) -> Option<BfmError> {
        self.latched
    }

    fn allocate_id(&mut self) -> OperationId {
        let id = OperationId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Queues a `Get` of `2^size_log2` bytes.
    pub fn submit_read(&mut self, address: u64, size_log2: u8, mask: u64) -> Completion<Vec<u8>> {
        let id = self.allocate_id();
        let request = Request {
            address,
            size_log2,
            mask,
        };
        let (op, completion) = Operation::read(id, request);
        self.enqueue(op);
        completion
    }

    /// Queues a `PutFullData` writing `payload` to the masked lanes.
    pub fn submit_write_full(
        &mut self,
        address: u64,
        size_log2: u8,
        mask: u64,
        payload: impl Into<Vec<u8>>,
    ) -> Completion<()> {
        let id = self.allocate_id();
        let request = Request {
            address,
            size_log2,
            mask,
        };
        let (op, completion) = Operation::write_full(id, request, payload.into());
        self.enqueue(op);
        completion
    }

    /// Queues a `PutPartialData`; see [`PartialWritePolicy`] for how it runs.
    pub fn submit_write_partial(
        &mut self,
        address: u64,
        size_log2: u8,
        mask: u64,
        payload: impl Into<Vec<u8>>,
    ) -> Completion<()> {
        let id = self.allocate_id();
        let request = Request {
            address,
            size_log2,
            mask,
        };
        let (op, completion) = Operation::write_partial(id, request, payload.into());
        self.enqueue(op);
        completion
    }

    fn enqueue(&mut self, op: Operation) {
        trace!(
            "queued {} {:?} at {:#x} (size_log2 {}, mask {:#x})",
            op.id(),
            op.kind(),
            op.request().address,
            op.request().size_log2,
            op.request().mask
        );
        self.queue.push(op);
    }

    /// Runs one evaluation step of `model`.
    ///
    /// # Errors
    ///
    /// Returns the latched [`BfmError`] once a precondition or protocol
    /// violation has been observed; the model is not evaluated afterwards.
    pub fn step<M: SimModel>(
        &mut self,
        model: &mut M,
        time: SimTime,
    ) -> Result<StepOutcome, BfmError> {
        self.step_traced(model, time, &mut NoopTrace)
    }

    /// Runs one evaluation step, reporting protocol milestones to `sink`.
    ///
    /// # Errors
    ///
    /// See [`Bfm::step`].
    pub fn step_traced<M: SimModel>(
        &mut self,
        model: &mut M,
        time: SimTime,
        sink: &mut dyn TraceSink,
    ) -> Result<StepOutcome, BfmError> {
        if let Some(fault) = self.latched {
            return Err(fault);
        }

        let Some(op) = self.queue.front() else {
            model.eval();
            return Ok(StepOutcome::Idle);
        };
        let id = op.id();
        let edge = model.signals().clk;

        let advance = if edge {
            match sample(op, self.phase, self.config.partial_writes, model.signals()) {
                Ok(advance) => advance,
                Err(violation) => {
                    let fault = BfmError::Protocol {
                        id,
                        time,
                        violation,
                    };
                    return Err(self.latch(fault, sink));
                }
            }
        } else {
            false
        };
        if advance && self.phase == Phase::AwaitResponseValid {
            sink.on_event(TraceEvent::ResponseReceived { id, time });
        }

        model.eval();

        if !advance {
            return Ok(StepOutcome::Pending {
                id,
                phase: self.phase,
            });
        }
        self.drive(model.signals_mut(), id, time, sink)
    }

    fn drive<D: BusWord>(
        &mut self,
        signals: &mut BusSignals<D>,
        id: OperationId,
        time: SimTime,
        sink: &mut dyn TraceSink,
    ) -> Result<StepOutcome, BfmError> {
        match self.phase {
            Phase::Idle => {
                let Some(op) = self.queue.front() else {
                    return Ok(StepOutcome::Idle);
                };
                let request = *op.request();
                let kind = op.kind();
                let data = match prepare_request::<D>(op) {
                    Ok(data) => data,
                    Err(violation) => {
                        let fault = BfmError::Precondition {
                            id,
                            time,
                            violation,
                        };
                        return Err(self.latch(fault, sink));
                    }
                };

                signals.a_valid = true;
                signals.a_opcode = kind.opcode().as_u8();
                signals.a_param = 0;
                signals.a_size = request.size_log2;
                signals.a_source = SOURCE_ID;
                signals.a_address = request.address;
                signals.a_mask = request.mask;
                signals.a_data = data;

                debug!(
                    "t={time}: dispatch {id} {kind:?} at {:#x} mask {:#x} data {data:#x}",
                    request.address, request.mask
                );
                sink.on_event(TraceEvent::RequestIssued {
                    id,
                    kind,
                    address: request.address,
                    time,
                });
                self.phase = Phase::AwaitRequestAccepted;
            }
            Phase::AwaitRequestAccepted => {
                signals.a_valid = false;
                signals.d_ready = true;

                trace!("t={time}: {id} request accepted");
                sink.on_event(TraceEvent::RequestAccepted { id, time });
                self.phase = Phase::AwaitResponseValid;
            }
            Phase::AwaitResponseValid => {
                signals.d_ready = false;
                self.queue.pop_front();

                debug!("t={time}: {id} complete, {} queued", self.queue.len());
                sink.on_event(TraceEvent::Completed { id, time });
                self.phase = Phase::Idle;
                return Ok(StepOutcome::Completed { id });
            }
        }
        Ok(StepOutcome::Pending {
            id,
            phase: self.phase,
        })
    }

    fn latch(&mut self, fault: BfmError, sink: &mut dyn TraceSink) -> BfmError {
        error!("{fault}");
        sink.on_event(TraceEvent::FaultRaised {
            id: fault.operation(),
            time: fault.time(),
        });
        let dropped = self.queue.abandon_all();
        debug!("abandoned {dropped} queued operations");
        self.latched = Some(fault);
        fault
    }
}

/// Returns `false` for operations whose arm never advances.
const fn is_driven(op: &Operation, policy: PartialWritePolicy) -> bool {
    match (op, policy) {
        (Operation::Read(_) | Operation::WriteFull(_), _)
        | (Operation::WritePartial(_), PartialWritePolicy::Execute) => true,
        (Operation::WritePartial(_), PartialWritePolicy::Inert) => false,
    }
}

fn sample<D: BusWord>(
    op: &Operation,
    phase: Phase,
    policy: PartialWritePolicy,
    signals: &BusSignals<D>,
) -> Result<bool, ProtocolViolation> {
    if !is_driven(op, policy) {
        return Ok(false);
    }
    match phase {
        Phase::Idle => Ok(true),
        Phase::AwaitRequestAccepted => Ok(signals.a_ready),
        Phase::AwaitResponseValid => {
            if !signals.d_valid {
                return Ok(false);
            }
            check_response(op, signals)?;
            deliver(op, signals);
            Ok(true)
        }
    }
}

fn check_response<D: BusWord>(
    op: &Operation,
    signals: &BusSignals<D>,
) -> Result<(), ProtocolViolation> {
    let opcode = op.kind().opcode().expected_response().as_u8();
    expect_field(ResponseField::Opcode, opcode, signals.d_opcode)?;
    expect_field(ResponseField::Param, 0, signals.d_param)?;
    expect_field(ResponseField::Size, op.request().size_log2, signals.d_size)?;
    expect_field(ResponseField::Source, SOURCE_ID, signals.d_source)
}

const fn expect_field(
    field: ResponseField,
    expected: u8,
    observed: u8,
) -> Result<(), ProtocolViolation> {
    if expected == observed {
        Ok(())
    } else {
        Err(ProtocolViolation {
            field,
            expected,
            observed,
        })
    }
}

fn deliver<D: BusWord>(op: &Operation, signals: &BusSignals<D>) {
    let delivered = match op {
        Operation::Read(read) => {
            let bytes = unpack_lanes(signals.d_data, read.request.mask);
            read.reply.send(bytes).is_ok()
        }
        Operation::WriteFull(write) | Operation::WritePartial(write) => {
            write.reply.send(()).is_ok()
        }
    };
    if !delivered {
        trace!("{} completed with no live handle", op.id());
    }
}

fn prepare_request<D: BusWord>(op: &Operation) -> Result<D, PreconditionViolation> {
    match op {
        Operation::Read(read) => {
            let Request {
                size_log2, mask, ..
            } = read.request;
            validate_transfer_mask(mask, size_log2, D::BYTES)?;
            Ok(D::default())
        }
        Operation::WriteFull(write) => {
            let Request {
                size_log2, mask, ..
            } = write.request;
            validate_transfer_mask(mask, size_log2, D::BYTES)?;
            // A matching popcount bounds size_log2 by 6.
            check_payload(1 << size_log2, write.payload.len())?;
            Ok(pack_lanes(mask, &write.payload))
        }
        Operation::WritePartial(write) => prepare_partial(write),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn prepare_partial<D: BusWord>(write: &WriteOp) -> Result<D, PreconditionViolation> {
    let Request {
        address,
        size_log2,
        mask,
    } = write.request;
    let lanes = D::BYTES;
    let bytes = match transfer_bytes(size_log2) {
        Some(bytes) if bytes <= lanes => bytes,
        _ => return Err(PreconditionViolation::TransferTooWide { size_log2, lanes }),
    };
    check_payload(bytes as usize, write.payload.len())?;

    let lane = (address % u64::from(lanes)) as u32;
    let base = lane & !(bytes - 1);
    let span = lane_mask(bytes) << base;
    if mask == 0 || mask & !span != 0 {
        return Err(PreconditionViolation::PartialMaskOutsideSpan { mask, span });
    }

    let word = (base..)
        .zip(&write.payload)
        .filter(|(lane, _)| (mask >> lane) & 1 == 1)
        .fold(D::default(), |word, (lane, byte)| set_byte(word, lane, *byte));
    Ok(word)
}

const fn check_payload(expected: usize, observed: usize) -> Result<(), PreconditionViolation> {
    if expected == observed {
        Ok(())
    } else {
        Err(PreconditionViolation::PayloadLength { expected, observed })
    }
}

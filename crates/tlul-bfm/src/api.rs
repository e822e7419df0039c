//! Public contracts between the bus-functional model, the simulated device
//! and the driver that owns simulation time.

use std::fmt;

use crate::codec::BusWord;
use crate::machine::Phase;
use crate::op::{OperationId, OperationKind};

/// Source identifier driven on every request; responses must echo it.
pub const SOURCE_ID: u8 = 0;

/// Driver-owned simulation time, counted in clock half-periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimTime(pub u64);

impl SimTime {
    /// Returns the time one half-period later.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port signals of a TL-UL slave as seen from the testbench.
///
/// Channel A carries requests from the model to the device, channel D
/// carries responses back. The model writes `a_*` (except `a_ready`) and
/// `d_ready`; the device writes the rest during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusSignals<D> {
    /// Clock level; evaluation edges are observed while it is high.
    pub clk: bool,
    /// Request valid.
    pub a_valid: bool,
    /// Request ready, driven by the device.
    pub a_ready: bool,
    /// Request opcode.
    pub a_opcode: u8,
    /// Request parameter, always zero for TL-UL.
    pub a_param: u8,
    /// Request size exponent.
    pub a_size: u8,
    /// Request source identifier.
    pub a_source: u8,
    /// Request byte address.
    pub a_address: u64,
    /// Request byte-enable mask, one bit per data lane.
    pub a_mask: u64,
    /// Request data word.
    pub a_data: D,
    /// Response valid, driven by the device.
    pub d_valid: bool,
    /// Response ready.
    pub d_ready: bool,
    /// Response opcode.
    pub d_opcode: u8,
    /// Response parameter.
    pub d_param: u8,
    /// Response size exponent.
    pub d_size: u8,
    /// Response source identifier.
    pub d_source: u8,
    /// Response sink identifier; not checked.
    pub d_sink: u8,
    /// Response data word.
    pub d_data: D,
}

/// Simulated device-under-test driven by the bus-functional model.
pub trait SimModel {
    /// Data word of channels A and D.
    type Data: BusWord;

    /// Current port signals.
    fn signals(&self) -> &BusSignals<Self::Data>;

    /// Port signals for driving inputs.
    fn signals_mut(&mut self) -> &mut BusSignals<Self::Data>;

    /// Settles the device's logic for the current input values.
    fn eval(&mut self);

    /// Returns `true` once the device has requested the end of simulation.
    fn got_finish(&self) -> bool {
        false
    }

    /// Runs end-of-simulation hooks.
    fn finalize(&mut self) {}
}

/// How `PutPartialData` operations are handled once they reach the head of
/// the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PartialWritePolicy {
    /// Accepted but never driven; the operation stays at the head forever.
    #[default]
    Inert,
    /// Driven as a masked write inside the addressed naturally aligned span.
    Execute,
}

/// Top-level configuration of a bus-functional model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BfmConfig {
    /// Handling of `PutPartialData` operations.
    pub partial_writes: PartialWritePolicy,
}

/// Result of one evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Queue empty; the device was evaluated without touching the bus.
    Idle,
    /// The head operation is in flight in `phase`.
    Pending {
        /// Active operation.
        id: OperationId,
        /// Phase after this step.
        phase: Phase,
    },
    /// The head operation finished and was removed from the queue.
    Completed {
        /// Finished operation.
        id: OperationId,
    },
}

/// Protocol milestones reported to a [`TraceSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// Channel A request asserted.
    RequestIssued {
        /// Operation being driven.
        id: OperationId,
        /// Request kind.
        kind: OperationKind,
        /// Request address.
        address: u64,
        /// Simulation time.
        time: SimTime,
    },
    /// Device accepted the request; waiting for the response.
    RequestAccepted {
        /// Operation being driven.
        id: OperationId,
        /// Simulation time.
        time: SimTime,
    },
    /// Channel D response sampled and checked; the completion was delivered.
    ResponseReceived {
        /// Operation being completed.
        id: OperationId,
        /// Simulation time.
        time: SimTime,
    },
    /// Operation removed from the queue.
    Completed {
        /// Finished operation.
        id: OperationId,
        /// Simulation time.
        time: SimTime,
    },
    /// A fault latched on the operation.
    FaultRaised {
        /// Faulting operation.
        id: OperationId,
        /// Simulation time.
        time: SimTime,
    },
}

impl TraceEvent {
    /// Operation the event belongs to.
    #[must_use]
    pub const fn id(&self) -> OperationId {
        match self {
            Self::RequestIssued { id, .. }
            | Self::RequestAccepted { id, .. }
            | Self::ResponseReceived { id, .. }
            | Self::Completed { id, .. }
            | Self::FaultRaised { id, .. } => *id,
        }
    }
}

/// Sink trait for protocol trace hooks.
pub trait TraceSink {
    /// Records an event in occurrence order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Trace sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BfmConfig, BusSignals, NoopTrace, PartialWritePolicy, SimTime, TraceEvent, TraceSink,
    };
    use crate::op::OperationId;

    #[test]
    fn default_config_keeps_partial_writes_inert() {
        assert_eq!(BfmConfig::default().partial_writes, PartialWritePolicy::Inert);
    }

    #[test]
    fn default_signals_are_deasserted() {
        let signals = BusSignals::<u64>::default();
        assert!(!signals.clk);
        assert!(!signals.a_valid);
        assert!(!signals.d_ready);
        assert_eq!(signals.a_data, 0);
        assert_eq!(signals.a_mask, 0);
    }

    #[test]
    fn sim_time_advances_and_displays_raw_count() {
        assert_eq!(SimTime(41).next(), SimTime(42));
        assert_eq!(SimTime(u64::MAX).next(), SimTime(0));
        assert_eq!(SimTime(7).to_string(), "7");
    }

    #[test]
    fn vec_sink_records_in_order() {
        let mut events = Vec::new();
        let first = TraceEvent::RequestAccepted {
            id: OperationId::new(0),
            time: SimTime(3),
        };
        let second = TraceEvent::Completed {
            id: OperationId::new(0),
            time: SimTime(5),
        };
        events.on_event(first);
        NoopTrace.on_event(first);
        events.on_event(second);
        assert_eq!(events, vec![first, second]);
        assert_eq!(second.id(), OperationId::new(0));
    }
}

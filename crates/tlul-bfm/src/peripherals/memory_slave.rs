//! Memory-backed TL-UL slave.
//!
//! Responds to `Get`, `PutFullData` and `PutPartialData` on a single
//! outstanding request at a time. The port is registered on the rising
//! clock edge; `a_ready` is recomputed on every evaluation.

use log::{trace, warn};

use crate::api::{BusSignals, SimModel};
use crate::codec::{get_byte, set_byte, BusWord};
use crate::op::{RequestOpcode, ResponseOpcode};

const DEFAULT_SIZE_BYTES: usize = 256;

/// Configuration for a [`MemorySlave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemorySlaveConfig {
    /// Backing store size; rounded up to a power of two of at least one
    /// bus word. Addresses wrap modulo this size.
    pub size_bytes: usize,
    /// Extra rising edges between accepting a request and raising `d_valid`.
    pub response_latency: u32,
}

impl Default for MemorySlaveConfig {
    fn default() -> Self {
        Self {
            size_bytes: DEFAULT_SIZE_BYTES,
            response_latency: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingResponse<D> {
    opcode: ResponseOpcode,
    size: u8,
    source: u8,
    data: D,
    remaining: u32,
}

/// Byte-addressed memory device speaking TL-UL.
#[derive(Debug, Clone)]
pub struct MemorySlave<D = u64> {
    config: MemorySlaveConfig,
    signals: BusSignals<D>,
    memory: Box<[u8]>,
    last_clk: bool,
    pending: Option<PendingResponse<D>>,
    accesses: u64,
}

impl<D: BusWord> Default for MemorySlave<D> {
    fn default() -> Self {
        Self::new(MemorySlaveConfig::default())
    }
}

impl<D: BusWord> MemorySlave<D> {
    /// Creates a zero-filled memory.
    #[must_use]
    pub fn new(config: MemorySlaveConfig) -> Self {
        let lanes = D::BYTES as usize;
        let size = config.size_bytes.max(lanes).next_power_of_two();
        Self {
            config,
            signals: BusSignals::default(),
            memory: vec![0; size].into_boxed_slice(),
            last_clk: false,
            pending: None,
            accesses: 0,
        }
    }

    /// Configuration the device was built with.
    #[must_use]
    pub const fn config(&self) -> &MemorySlaveConfig {
        &self.config
    }

    /// Backing store contents.
    #[must_use]
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Copies `bytes` into the backing store starting at `address`, wrapping.
    pub fn load(&mut self, address: u64, bytes: &[u8]) {
        for (offset, byte) in (0_u64..).zip(bytes) {
            let index = self.index(address.wrapping_add(offset));
            self.memory[index] = *byte;
        }
    }

    /// Number of requests accepted so far.
    #[must_use]
    pub const fn accesses(&self) -> u64 {
        self.accesses
    }

    /// Returns `true` while a request is being served.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.pending.is_some() || self.signals.d_valid
    }

    /// Clears memory and port state.
    pub fn reset(&mut self) {
        self.memory.fill(0);
        self.signals = BusSignals::default();
        self.last_clk = false;
        self.pending = None;
        self.accesses = 0;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn index(&self, address: u64) -> usize {
        (address & (self.memory.len() as u64 - 1)) as usize
    }

    fn on_rising_edge(&mut self) {
        if self.signals.d_valid && self.signals.d_ready {
            self.signals.d_valid = false;
        }

        if let Some(pending) = self.pending.as_mut() {
            pending.remaining = pending.remaining.saturating_sub(1);
            if pending.remaining == 0 {
                let ready = *pending;
                self.pending = None;
                self.present(ready);
            }
        }

        if self.signals.a_valid && self.signals.a_ready {
            let Some(response) = self.access() else {
                return;
            };
            self.accesses += 1;
            if response.remaining == 0 {
                self.present(response);
            } else {
                self.pending = Some(response);
            }
        }
    }

    fn access(&mut self) -> Option<PendingResponse<D>> {
        let BusSignals {
            a_opcode,
            a_size,
            a_source,
            a_address,
            a_mask,
            a_data,
            ..
        } = self.signals;
        let lanes = u64::from(D::BYTES);
        let base = a_address & !(lanes - 1);

        let (opcode, data) = match RequestOpcode::from_u8(a_opcode) {
            Some(RequestOpcode::Get) => {
                let data = (0..D::BYTES).fold(D::default(), |word, lane| {
                    let index = self.index(base + u64::from(lane));
                    set_byte(word, lane, self.memory[index])
                });
                trace!("get {a_address:#x} mask {a_mask:#x} -> {data:#x}");
                (ResponseOpcode::AccessAckData, data)
            }
            Some(RequestOpcode::PutFullData | RequestOpcode::PutPartialData) => {
                for lane in (0..D::BYTES).filter(|lane| (a_mask >> lane) & 1 == 1) {
                    let index = self.index(base + u64::from(lane));
                    self.memory[index] = get_byte(a_data, lane);
                }
                trace!("put {a_address:#x} mask {a_mask:#x} <- {a_data:#x}");
                (ResponseOpcode::AccessAck, D::default())
            }
            None => {
                warn!("ignoring request with unknown opcode {a_opcode}");
                return None;
            }
        };

        Some(PendingResponse {
            opcode,
            size: a_size,
            source: a_source,
            data,
            remaining: self.config.response_latency,
        })
    }

    fn present(&mut self, response: PendingResponse<D>) {
        self.signals.d_valid = true;
        self.signals.d_opcode = response.opcode.as_u8();
        self.signals.d_param = 0;
        self.signals.d_size = response.size;
        self.signals.d_source = response.source;
        self.signals.d_sink = 0;
        self.signals.d_data = response.data;
    }
}

impl<D: BusWord> SimModel for MemorySlave<D> {
    type Data = D;

    fn signals(&self) -> &BusSignals<D> {
        &self.signals
    }

    fn signals_mut(&mut self) -> &mut BusSignals<D> {
        &mut self.signals
    }

    fn eval(&mut self) {
        let rising = self.signals.clk && !self.last_clk;
        self.last_clk = self.signals.clk;
        if rising {
            self.on_rising_edge();
        }
        self.signals.a_ready = !self.is_busy();
    }
}

use std::collections::VecDeque;

use log::trace;

use super::{LineState, UartConfig, UartError};
use crate::codec::get_bit;

/// Serializes bytes onto a TX line.
#[derive(Debug, Clone)]
pub struct UartSender {
    clocks_per_bit: usize,
    state: LineState,
    clock_count: usize,
    bit_index: u32,
    current: Option<u8>,
    backlog: VecDeque<u8>,
}

impl UartSender {
    /// Creates an idle sender.
    ///
    /// # Errors
    ///
    /// Returns [`UartError::ZeroClocksPerBit`] for a zero bit time.
    pub fn new(config: UartConfig) -> Result<Self, UartError> {
        Ok(Self {
            clocks_per_bit: config.validate()?,
            state: LineState::Idle,
            clock_count: 0,
            bit_index: 0,
            current: None,
            backlog: VecDeque::new(),
        })
    }

    /// Returns `true` while a byte is being sent or waiting to be sent.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.current.is_some() || !self.backlog.is_empty()
    }

    /// Starts sending `byte` on the next active edge.
    ///
    /// # Errors
    ///
    /// Returns [`UartError::Busy`] while an earlier byte is outstanding.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), UartError> {
        self.write_bytes(&[byte])
    }

    /// Queues `bytes` to be sent back to back.
    ///
    /// # Errors
    ///
    /// Returns [`UartError::Busy`] while an earlier write is outstanding.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), UartError> {
        if self.is_busy() {
            return Err(UartError::Busy);
        }
        self.backlog.extend(bytes);
        Ok(())
    }

    fn hold_bit(&mut self, next: LineState) {
        if self.clock_count < self.clocks_per_bit - 1 {
            self.clock_count += 1;
        } else {
            self.clock_count = 0;
            self.state = next;
        }
    }

    /// Drives `tx` for one evaluation.
    ///
    /// Returns the byte whose stop bit just finished.
    pub fn eval(&mut self, clk: bool, tx: &mut bool) -> Option<u8> {
        if !clk {
            return None;
        }
        match self.state {
            LineState::Idle => {
                *tx = true;
                self.clock_count = 0;
                self.bit_index = 0;
                if self.current.is_none() {
                    self.current = self.backlog.pop_front();
                }
                if let Some(byte) = self.current {
                    trace!("uart tx start {byte:#04x}");
                    self.state = LineState::StartBit;
                }
            }
            LineState::StartBit => {
                *tx = false;
                self.hold_bit(LineState::DataBits);
            }
            LineState::DataBits => {
                *tx = self.current.is_some_and(|byte| get_bit(byte, self.bit_index));
                if self.clock_count < self.clocks_per_bit - 1 {
                    self.clock_count += 1;
                } else {
                    self.clock_count = 0;
                    if self.bit_index < 7 {
                        self.bit_index += 1;
                    } else {
                        self.bit_index = 0;
                        self.state = LineState::StopBit;
                    }
                }
            }
            LineState::StopBit => {
                *tx = true;
                self.hold_bit(LineState::Cleanup);
            }
            LineState::Cleanup => {
                self.state = LineState::Idle;
                return self.current.take();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::UartSender;
    use crate::uart::{UartConfig, UartError};

    #[test]
    fn zero_bit_time_is_rejected() {
        assert_eq!(
            UartSender::new(UartConfig { clocks_per_bit: 0 }).err(),
            Some(UartError::ZeroClocksPerBit)
        );
    }

    #[test]
    fn frame_is_start_lsb_first_data_stop() {
        let mut sender = UartSender::new(UartConfig { clocks_per_bit: 1 }).expect("valid");
        sender.write_byte(0b1000_0110).expect("idle");
        assert_eq!(sender.write_byte(0), Err(UartError::Busy));

        let mut line = Vec::new();
        let mut tx = true;
        let mut sent = None;
        for _ in 0..12 {
            assert_eq!(sender.eval(false, &mut tx), None);
            if let Some(byte) = sender.eval(true, &mut tx) {
                sent = Some(byte);
            }
            line.push(tx);
        }
        // idle, start, bits 0..=7, stop, then cleanup holds the line
        assert_eq!(
            line,
            vec![true, false, false, true, true, false, false, false, false, true, true, true]
        );
        assert_eq!(sent, Some(0b1000_0110));
        assert!(!sender.is_busy());
    }
}

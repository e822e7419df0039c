use log::trace;

use super::{LineState, UartConfig, UartError};
use crate::codec::set_bit;

/// Deserializes bytes from an RX line.
#[derive(Debug, Clone)]
pub struct UartReceiver {
    clocks_per_bit: usize,
    state: LineState,
    clock_count: usize,
    bit_index: u32,
    byte: u8,
}

impl UartReceiver {
    /// Creates a receiver waiting for a start bit.
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
            byte: 0,
        })
    }

    /// Returns `true` while a frame is being received.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state != LineState::Idle
    }

    /// Samples `rx` for one evaluation.
    ///
    /// Returns a byte once its stop bit has passed.
    pub fn eval(&mut self, clk: bool, rx: bool) -> Option<u8> {
        if !clk {
            return None;
        }
        match self.state {
            LineState::Idle => {
                self.clock_count = 0;
                self.bit_index = 0;
                if !rx {
                    self.state = LineState::StartBit;
                }
            }
            LineState::StartBit => {
                // Re-check the line in the middle of the start bit.
                if self.clock_count == (self.clocks_per_bit - 1) / 2 {
                    if rx {
                        trace!("uart rx glitch, back to idle");
                        self.state = LineState::Idle;
                    } else {
                        self.clock_count = 0;
                        self.state = LineState::DataBits;
                    }
                } else {
                    self.clock_count += 1;
                }
            }
            LineState::DataBits => {
                if self.clock_count < self.clocks_per_bit - 1 {
                    self.clock_count += 1;
                } else {
                    self.clock_count = 0;
                    self.byte = set_bit(self.byte, self.bit_index, rx);
                    if self.bit_index < 7 {
                        self.bit_index += 1;
                    } else {
                        self.bit_index = 0;
                        self.state = LineState::StopBit;
                    }
                }
            }
            LineState::StopBit => {
                if self.clock_count < self.clocks_per_bit - 1 {
                    self.clock_count += 1;
                } else {
                    self.clock_count = 0;
                    self.state = LineState::Cleanup;
                }
            }
            LineState::Cleanup => {
                self.state = LineState::Idle;
                trace!("uart rx {:#04x}", self.byte);
                return Some(self.byte);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::UartReceiver;
    use crate::uart::UartConfig;

    #[test]
    fn short_low_pulse_is_not_a_start_bit() {
        let mut receiver = UartReceiver::new(UartConfig { clocks_per_bit: 4 }).expect("valid");
        assert_eq!(receiver.eval(true, false), None);
        assert!(receiver.is_busy());
        assert_eq!(receiver.eval(true, true), None);
        assert_eq!(receiver.eval(true, true), None);
        assert!(!receiver.is_busy());
    }

    #[test]
    fn low_clock_is_ignored() {
        let mut receiver = UartReceiver::new(UartConfig::default()).expect("valid");
        assert_eq!(receiver.eval(false, false), None);
        assert!(!receiver.is_busy());
    }
}

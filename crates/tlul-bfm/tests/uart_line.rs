//! UART sender/receiver loopback over a shared line.

#![allow(clippy::pedantic, clippy::nursery)]

use log as _;
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use tlul_bfm::{UartConfig, UartError, UartReceiver, UartSender};

/// Clocks a sender and receiver wired back to back until `expected` bytes
/// arrive or `max_cycles` pass.
fn loopback(config: UartConfig, bytes: &[u8], max_cycles: usize) -> (Vec<u8>, Vec<u8>) {
    let mut sender = UartSender::new(config).expect("valid config");
    let mut receiver = UartReceiver::new(config).expect("valid config");
    sender.write_bytes(bytes).expect("sender idle");

    let mut line = true;
    let mut sent = Vec::new();
    let mut received = Vec::new();
    for _ in 0..max_cycles {
        for clk in [false, true] {
            if let Some(byte) = sender.eval(clk, &mut line) {
                sent.push(byte);
            }
            if let Some(byte) = receiver.eval(clk, line) {
                received.push(byte);
            }
        }
        if received.len() == bytes.len() && !sender.is_busy() {
            break;
        }
    }
    (sent, received)
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(4)]
#[case(7)]
#[case(16)]
fn loopback_delivers_text(#[case] clocks_per_bit: usize) {
    let text = b"TL-UL says hi\n";
    let (sent, received) = loopback(UartConfig { clocks_per_bit }, text, 20 * 12 * clocks_per_bit);
    assert_eq!(sent, text.to_vec());
    assert_eq!(received, text.to_vec());
}

#[test]
fn frame_takes_ten_bit_times_plus_turnaround() {
    let config = UartConfig { clocks_per_bit: 4 };
    let mut sender = UartSender::new(config).expect("valid config");
    sender.write_byte(0x55).expect("sender idle");

    let mut line = true;
    let mut edges = 0;
    loop {
        edges += 1;
        if sender.eval(true, &mut line).is_some() {
            break;
        }
        assert!(edges < 100, "frame never finished");
    }
    // idle pickup, start + 8 data + stop at 4 edges each, cleanup
    assert_eq!(edges, 1 + 10 * 4 + 1);
}

#[test]
fn busy_sender_rejects_new_writes() {
    let mut sender = UartSender::new(UartConfig::default()).expect("valid config");
    sender.write_bytes(b"ab").expect("sender idle");
    assert_eq!(sender.write_byte(b'c'), Err(UartError::Busy));
    assert_eq!(sender.write_bytes(b"cd"), Err(UartError::Busy));
}

#[test]
fn zero_clocks_per_bit_is_rejected_on_both_sides() {
    let config = UartConfig { clocks_per_bit: 0 };
    assert_eq!(UartSender::new(config).err(), Some(UartError::ZeroClocksPerBit));
    assert_eq!(UartReceiver::new(config).err(), Some(UartError::ZeroClocksPerBit));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_bytes_survive_loopback(
        bytes in proptest::collection::vec(any::<u8>(), 1..16),
        clocks_per_bit in 2_usize..6,
    ) {
        let max_cycles = (bytes.len() + 1) * 12 * clocks_per_bit;
        let (_, received) = loopback(UartConfig { clocks_per_bit }, &bytes, max_cycles);
        prop_assert_eq!(received, bytes);
    }
}

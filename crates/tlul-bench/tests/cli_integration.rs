//! Integration tests for the tlul-bench CLI.

use anyhow as _;
use clap as _;
use env_logger as _;
use log as _;
use rand as _;
use serde as _;
use thiserror as _;
use tlul_bench as _;
use tlul_bfm as _;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn bench(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tlul-bench"))
        .args(args)
        .output()
        .expect("failed to run tlul-bench")
}

fn read_report(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("report written");
    serde_json::from_str(&text).expect("report is JSON")
}

#[test]
fn memory_scenario_writes_a_passing_report() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = temp_dir.path().join("report.json");

    let output = bench(&[
        "memory",
        "--seed",
        "42",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Memory passed"));

    let json = read_report(&report);
    assert_eq!(json["scenario"], "memory");
    assert_eq!(json["seed"], 42);
    assert_eq!(json["operations"], 64);
    assert_eq!(json["bytes"], 256);
    assert_eq!(json["final_time"], 384);
    assert_eq!(json["outcome"]["status"], "passed");
}

#[test]
fn half_word_readback_with_latency() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = temp_dir.path().join("half.json");

    let output = bench(&[
        "memory",
        "--size",
        "64",
        "--latency",
        "3",
        "--half-words",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(read_report(&report)["operations"], 8 + 16);
}

#[test]
fn vcd_dump_has_header_and_samples() {
    let temp_dir = tempfile::tempdir().unwrap();
    let vcd = temp_dir.path().join("bus.vcd");

    let output = bench(&["memory", "--size", "16", "--vcd", vcd.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");

    let text = fs::read_to_string(&vcd).unwrap();
    assert!(text.starts_with("$version tlul-bench"));
    assert!(text.contains("$var wire 64 * a_data $end"));
    assert!(text.contains("$enddefinitions $end"));
    assert!(text.contains("#0\n$dumpvars\n"));
    assert!(text.contains("#24\n"));
}

#[test]
fn time_limit_fails_with_a_failed_report() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = temp_dir.path().join("timeout.json");

    let output = bench(&[
        "memory",
        "--max-time",
        "10",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: run stopped at t=10"));

    let json = read_report(&report);
    assert_eq!(json["outcome"]["status"], "failed");
    assert!(json["outcome"]["reason"]
        .as_str()
        .unwrap()
        .contains("TimeLimit"));
}

#[test]
fn uart_loopback_round_trips_text() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = temp_dir.path().join("uart.json");

    let output = bench(&[
        "uart",
        "--text",
        "ping",
        "--clocks-per-bit",
        "5",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");

    let json = read_report(&report);
    assert_eq!(json["scenario"], "uart");
    assert_eq!(json["seed"], Value::Null);
    assert_eq!(json["bytes"], 4);
}

#[test]
fn zero_clocks_per_bit_is_rejected() {
    let output = bench(&["uart", "--clocks-per-bit", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("clocks_per_bit must be non-zero"));
}

#[test]
fn verbose_flag_enables_debug_logging() {
    let output = bench(&["memory", "--size", "8", "-vv"]);
    assert!(output.status.success(), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[DEBUG tlul_bfm::machine]"), "{stderr}");
    assert!(stderr.contains("dispatch #0"));
}

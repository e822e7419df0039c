//! Value Change Dump writer for the TL-UL bus register file.
//!
//! One [`VcdWriter::sample`] per half-cycle; only signals whose value changed
//! since the previous sample are emitted.

use std::io::{self, Write};

use tlul_bfm::{BusSignals, BusWord, SimTime};

const TOP_MODULE: &str = "tlul";

/// Observer of the bus after every half-cycle.
pub trait SignalProbe {
    /// Records the signal values at `time`.
    ///
    /// # Errors
    ///
    /// Implementations report output failures.
    fn sample(&mut self, time: SimTime, signals: &BusSignals<u64>) -> io::Result<()>;
}

/// Probe that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl SignalProbe for NoProbe {
    fn sample(&mut self, _time: SimTime, _signals: &BusSignals<u64>) -> io::Result<()> {
        Ok(())
    }
}

/// Streams a VCD waveform of [`BusSignals`] to `W`.
#[derive(Debug)]
pub struct VcdWriter<W: Write> {
    out: W,
    widths: Vec<u32>,
    last: Option<Vec<u128>>,
}

fn signal_names() -> [&'static str; 18] {
    [
        "clk", "a_valid", "a_ready", "a_opcode", "a_param", "a_size", "a_source", "a_address",
        "a_mask", "a_data", "d_valid", "d_ready", "d_opcode", "d_param", "d_size", "d_source",
        "d_sink", "d_data",
    ]
}

fn signal_widths(data_bits: u32) -> [u32; 18] {
    [
        1, 1, 1, 3, 3, 8, 8, 64, 64, data_bits, 1, 1, 3, 3, 8, 8, 8, data_bits,
    ]
}

fn signal_values<D: BusWord>(s: &BusSignals<D>) -> Vec<u128> {
    vec![
        u128::from(s.clk),
        u128::from(s.a_valid),
        u128::from(s.a_ready),
        u128::from(s.a_opcode),
        u128::from(s.a_param),
        u128::from(s.a_size),
        u128::from(s.a_source),
        u128::from(s.a_address),
        u128::from(s.a_mask),
        s.a_data.to_u128(),
        u128::from(s.d_valid),
        u128::from(s.d_ready),
        u128::from(s.d_opcode),
        u128::from(s.d_param),
        u128::from(s.d_size),
        u128::from(s.d_source),
        u128::from(s.d_sink),
        s.d_data.to_u128(),
    ]
}

/// Short printable identifier of the `index`-th signal.
fn identifier(index: usize) -> char {
    char::from_u32(u32::from(b'!') + u32::try_from(index).unwrap_or(0)).unwrap_or('?')
}

impl<W: Write> VcdWriter<W> {
    /// Writes the header for a bus whose data words are `data_bits` wide.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn new(mut out: W, data_bits: u32) -> io::Result<Self> {
        let widths = signal_widths(data_bits);
        writeln!(out, "$version tlul-bench {} $end", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "$timescale 1ns $end")?;
        writeln!(out, "$scope module {TOP_MODULE} $end")?;
        for (index, (name, width)) in signal_names().iter().zip(widths).enumerate() {
            writeln!(out, "$var wire {width} {} {name} $end", identifier(index))?;
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;
        Ok(Self {
            out,
            widths: widths.to_vec(),
            last: None,
        })
    }

    /// Emits the values that changed since the previous sample.
    ///
    /// The first sample dumps every signal.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn sample_word<D: BusWord>(
        &mut self,
        time: SimTime,
        signals: &BusSignals<D>,
    ) -> io::Result<()> {
        let values = signal_values(signals);
        let changed: Vec<usize> = match &self.last {
            None => (0..values.len()).collect(),
            Some(last) => (0..values.len())
                .filter(|index| last[*index] != values[*index])
                .collect(),
        };
        let first = self.last.is_none();

        if !changed.is_empty() {
            writeln!(self.out, "#{time}")?;
            if first {
                writeln!(self.out, "$dumpvars")?;
            }
            for index in changed {
                self.write_value(index, values[index])?;
            }
            if first {
                writeln!(self.out, "$end")?;
            }
        }
        self.last = Some(values);
        Ok(())
    }

    fn write_value(&mut self, index: usize, value: u128) -> io::Result<()> {
        let id = identifier(index);
        if self.widths[index] == 1 {
            writeln!(self.out, "{value}{id}")
        } else {
            writeln!(self.out, "b{value:b} {id}")
        }
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Propagates flush failures.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> SignalProbe for VcdWriter<W> {
    fn sample(&mut self, time: SimTime, signals: &BusSignals<u64>) -> io::Result<()> {
        self.sample_word(time, signals)
    }
}

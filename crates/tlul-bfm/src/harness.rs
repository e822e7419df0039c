//! Clock-and-time driver around a [`Bfm`] and its device.

use log::{debug, info};

use crate::api::{BfmConfig, NoopTrace, SimModel, SimTime, StepOutcome, TraceSink};
use crate::fault::BfmError;
use crate::machine::Bfm;

/// Why [`Harness::run_until_idle`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunStop {
    /// Every submitted operation completed.
    Idle,
    /// The device requested the end of simulation.
    Finished,
    /// Simulation time reached the limit first.
    TimeLimit,
}

/// Owns a device, its bus-functional model and the simulation clock.
///
/// The clock starts high. Each [`Harness::half_cycle`] advances time by
/// one, toggles the clock and steps the model, so active edges fall on
/// even times.
#[derive(Debug)]
pub struct Harness<M> {
    model: M,
    bfm: Bfm,
    time: SimTime,
}

impl<M: SimModel> Harness<M> {
    /// Wraps `model`, raising its clock.
    pub fn new(mut model: M, config: BfmConfig) -> Self {
        model.signals_mut().clk = true;
        Self {
            model,
            bfm: Bfm::new(config),
            time: SimTime::default(),
        }
    }

    /// Current simulation time.
    #[must_use]
    pub const fn time(&self) -> SimTime {
        self.time
    }

    /// Bus-functional model, for inspection.
    #[must_use]
    pub const fn bfm(&self) -> &Bfm {
        &self.bfm
    }

    /// Bus-functional model, for submitting operations.
    pub fn bfm_mut(&mut self) -> &mut Bfm {
        &mut self.bfm
    }

    /// Device under test.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Device under test, mutably.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Advances one half-period and steps the model.
    ///
    /// # Errors
    ///
    /// Propagates the model's latched [`BfmError`].
    pub fn half_cycle(&mut self) -> Result<StepOutcome, BfmError> {
        self.half_cycle_traced(&mut NoopTrace)
    }

    /// [`Harness::half_cycle`] with protocol events sent to `sink`.
    ///
    /// # Errors
    ///
    /// Propagates the model's latched [`BfmError`].
    pub fn half_cycle_traced(
        &mut self,
        sink: &mut dyn TraceSink,
    ) -> Result<StepOutcome, BfmError> {
        self.time = self.time.next();
        let signals = self.model.signals_mut();
        signals.clk = !signals.clk;
        self.bfm.step_traced(&mut self.model, self.time, sink)
    }

    /// Steps until every queued operation completed, the device finished,
    /// or `max_time` is reached.
    ///
    /// # Errors
    ///
    /// Stops at the first [`BfmError`].
    pub fn run_until_idle(&mut self, max_time: SimTime) -> Result<RunStop, BfmError> {
        self.run_until_idle_traced(max_time, &mut NoopTrace)
    }

    /// [`Harness::run_until_idle`] with protocol events sent to `sink`.
    ///
    /// # Errors
    ///
    /// Stops at the first [`BfmError`].
    pub fn run_until_idle_traced(
        &mut self,
        max_time: SimTime,
        sink: &mut dyn TraceSink,
    ) -> Result<RunStop, BfmError> {
        let stop = loop {
            if self.bfm.is_idle() {
                break RunStop::Idle;
            }
            if self.model.got_finish() {
                break RunStop::Finished;
            }
            if self.time >= max_time {
                break RunStop::TimeLimit;
            }
            self.half_cycle_traced(sink)?;
        };
        debug!("run stopped at t={}: {stop:?}", self.time);
        Ok(stop)
    }

    /// Steps exactly `half_cycles` times regardless of queue state.
    ///
    /// # Errors
    ///
    /// Stops at the first [`BfmError`].
    pub fn run_for(&mut self, half_cycles: u64) -> Result<(), BfmError> {
        for _ in 0..half_cycles {
            self.half_cycle()?;
        }
        Ok(())
    }

    /// Runs the device's end-of-simulation hooks and hands it back.
    pub fn finish(mut self) -> M {
        info!(
            "simulation finished at t={} with {} operations pending",
            self.time,
            self.bfm.pending()
        );
        self.model.finalize();
        self.model
    }
}

//! Device drivers for the weigh station.
//!
//! The simulated devices run anywhere and back `weigh_cli run`; the `gpio`
//! module (feature `hardware`, Linux only) drives real pins through `rppal`.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod serial;
pub mod util;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use weigh_traits::{AnalogInput, DigitalOutput, HwResult, RangeSensor};

use crate::error::HwError;

pub use serial::{ReaderRx, WriterTx};

/// Seconds between range reads the simulation assumes.
const SIM_READ_INTERVAL_S: f32 = 0.1;

/// A vehicle that appears at `start_cm` and drives toward the sensor at a
/// constant speed until it halts at `stop_cm`.
///
/// Position advances once per read call, including reads that fail by
/// injection, so the profile stays tied to the sampling cadence.
pub struct SimulatedRangeSensor {
    position_cm: f32,
    stop_cm: u16,
    step_cm: f32,
    fail_every: u32,
    reads: u32,
}

impl SimulatedRangeSensor {
    pub fn new(start_cm: u16, stop_cm: u16, speed_mps: f32) -> Self {
        Self {
            position_cm: f32::from(start_cm),
            stop_cm: stop_cm.min(start_cm),
            step_cm: (speed_mps * 100.0 * SIM_READ_INTERVAL_S).max(0.0),
            fail_every: 0,
            reads: 0,
        }
    }

    /// Make every `n`th read fail with an echo timeout (0 disables).
    pub fn with_failures_every(mut self, n: u32) -> Self {
        self.fail_every = n;
        self
    }

    pub fn position_cm(&self) -> u16 {
        self.position_cm.round() as u16
    }
}

impl RangeSensor for SimulatedRangeSensor {
    fn read_distance_cm(&mut self) -> HwResult<u16> {
        self.reads = self.reads.wrapping_add(1);
        let current = self.position_cm();
        self.position_cm = (self.position_cm - self.step_cm).max(f32::from(self.stop_cm));
        if self.fail_every != 0 && self.reads % self.fail_every == 0 {
            tracing::trace!(read = self.reads, "simulated echo timeout");
            return Err(HwError::EchoTimeout.into());
        }
        Ok(current)
    }
}

/// Load cells holding a constant millivolt level per channel.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLoadCells {
    levels: HashMap<u8, u16>,
}

impl SimulatedLoadCells {
    pub fn new(levels: impl IntoIterator<Item = (u8, u16)>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }
}

impl AnalogInput for SimulatedLoadCells {
    fn read_channel(&mut self, channel: u8) -> HwResult<u16> {
        self.levels
            .get(&channel)
            .copied()
            .ok_or_else(|| HwError::NoSuchChannel(channel).into())
    }
}

/// Output line that only remembers its level. Clones share the level.
#[derive(Debug, Clone)]
pub struct SimulatedOutput {
    name: &'static str,
    level: Arc<AtomicBool>,
}

impl SimulatedOutput {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            level: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }
}

impl DigitalOutput for SimulatedOutput {
    fn set_high(&mut self) -> HwResult<()> {
        self.level.store(true, Ordering::Release);
        tracing::trace!(line = self.name, "high");
        Ok(())
    }

    fn set_low(&mut self) -> HwResult<()> {
        self.level.store(false, Ordering::Release);
        tracing::trace!(line = self.name, "low");
        Ok(())
    }
}

//! Speed advisory indicators (three mutually exclusive LEDs).

use std::sync::Arc;

use weigh_traits::DigitalOutput;
use weigh_traits::clock::Clock;

use crate::error::StationError;
use crate::shared::Shared;
use crate::timing::{ADVISORY_REFRESH_HZ, HIGH_SPEED_MPS, period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryLevel {
    /// LED 1.
    Stopped,
    /// LED 2.
    Moderate,
    /// LED 3.
    High,
}

impl AdvisoryLevel {
    /// Classify a speed estimate. Undefined speed reads as Stopped; a
    /// receding vehicle is classified by magnitude.
    pub fn from_speed(speed: Option<f32>) -> Self {
        match speed.map(f32::abs) {
            Some(v) if v > HIGH_SPEED_MPS => Self::High,
            Some(v) if v > 0.0 => Self::Moderate,
            _ => Self::Stopped,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Stopped => 0,
            Self::Moderate => 1,
            Self::High => 2,
        }
    }

    pub(crate) fn code(self) -> u8 {
        self.index() as u8 + 1
    }

    pub(crate) fn from_code(c: u8) -> Option<Self> {
        match c {
            1 => Some(Self::Stopped),
            2 => Some(Self::Moderate),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

/// Drives the three indicator outputs, at most one lit at a time.
pub struct AdvisoryController<O> {
    leds: [O; 3],
    active: Option<AdvisoryLevel>,
}

impl<O: DigitalOutput> AdvisoryController<O> {
    pub fn new(stopped: O, moderate: O, high: O) -> Self {
        Self {
            leds: [stopped, moderate, high],
            active: None,
        }
    }

    pub fn active(&self) -> Option<AdvisoryLevel> {
        self.active
    }

    /// Force every indicator low regardless of the tracked state.
    pub fn all_off(&mut self) -> Result<(), StationError> {
        for led in &mut self.leds {
            led.set_low()
                .map_err(|e| StationError::Output(e.to_string()))?;
        }
        self.active = None;
        Ok(())
    }

    /// Show `level` (`None` = all off). The previous indicator is cleared
    /// before the new one is asserted. Returns whether anything changed.
    pub fn apply(&mut self, level: Option<AdvisoryLevel>) -> Result<bool, StationError> {
        if level == self.active {
            return Ok(false);
        }
        if let Some(prev) = self.active {
            self.leds[prev.index()]
                .set_low()
                .map_err(|e| StationError::Output(e.to_string()))?;
            self.active = None;
        }
        if let Some(next) = level {
            self.leds[next.index()]
                .set_high()
                .map_err(|e| StationError::Output(e.to_string()))?;
            self.active = Some(next);
        }
        Ok(true)
    }
}

/// Advisory task body: refresh the indicators every period until shutdown.
pub(crate) fn run<O, C>(mut ctrl: AdvisoryController<O>, shared: Arc<Shared>, clock: C)
where
    O: DigitalOutput,
    C: Clock,
{
    let period = period(ADVISORY_REFRESH_HZ);
    loop {
        if shared.is_shutdown() {
            break;
        }
        let level = if shared.state.is_armed() {
            Some(AdvisoryLevel::from_speed(shared.speed.load()))
        } else {
            None
        };
        match ctrl.apply(level) {
            Ok(true) => {
                shared.set_advisory(level);
                tracing::debug!(level = level.map(AdvisoryLevel::as_str), "advisory changed");
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "failed to drive advisory indicators"),
        }
        if shared.is_shutdown() {
            break;
        }
        clock.sleep(period);
    }
    if let Err(e) = ctrl.all_off() {
        tracing::warn!(error = %e, "failed to clear indicators on shutdown");
    }
    shared.set_advisory(None);
    tracing::trace!("advisory task exiting");
}

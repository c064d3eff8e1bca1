//! Weighing state machine: Idle -> Sampling -> Reporting -> Idle.
//!
//! Driven by the 5 ms tick source. A cycle starts when the station is armed and
//! the vehicle reads exactly 0 m/s inside the approach gate; each tick then
//! reads both load-cell channels once until every channel holds
//! `SAMPLES_PER_CHANNEL` samples. The total is the sum of the per-channel
//! averages.

use std::sync::Arc;

use crossbeam_channel as xch;
use weigh_traits::AnalogInput;

use crate::calibration::LoadCellCalibration;
use crate::hw_error::map_hw_error;
use crate::shared::Shared;
use crate::speed::PeakSpeed;
use crate::state::StateSnapshot;
use crate::status::WeighEvent;
use crate::timing::SAMPLES_PER_CHANNEL;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeighPhase {
    #[default]
    Idle,
    Sampling,
    Reporting,
}

impl WeighPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sampling => "sampling",
            Self::Reporting => "reporting",
        }
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Sampling => 1,
            Self::Reporting => 2,
        }
    }

    pub(crate) fn from_code(c: u8) -> Self {
        match c {
            1 => Self::Sampling,
            2 => Self::Reporting,
            _ => Self::Idle,
        }
    }
}

/// Result of one completed cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeighResult {
    pub weight_kg: u32,
    /// Peak approach speed observed before the vehicle stopped.
    pub max_speed_mps: f32,
}

/// Running sum and count for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSum {
    pub sum_kg: u32,
    pub count: u32,
}

/// Per-channel running sums for the current cycle.
///
/// Counts never exceed the target; extra samples are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightAccumulator {
    channels: [ChannelSum; 2],
    target: u32,
}

impl Default for WeightAccumulator {
    fn default() -> Self {
        Self::new(SAMPLES_PER_CHANNEL)
    }
}

impl WeightAccumulator {
    pub fn new(target: u32) -> Self {
        Self {
            channels: [ChannelSum::default(); 2],
            target: target.max(1),
        }
    }

    pub fn reset(&mut self) {
        self.channels = [ChannelSum::default(); 2];
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn channel(&self, idx: usize) -> ChannelSum {
        self.channels[idx]
    }

    pub fn is_channel_full(&self, idx: usize) -> bool {
        self.channels[idx].count >= self.target
    }

    /// Add one converted sample; returns false if the channel is already full.
    pub fn add(&mut self, idx: usize, kg: u32) -> bool {
        if self.is_channel_full(idx) {
            return false;
        }
        let ch = &mut self.channels[idx];
        ch.sum_kg = ch.sum_kg.saturating_add(kg);
        ch.count += 1;
        true
    }

    pub fn is_complete(&self) -> bool {
        (0..self.channels.len()).all(|i| self.is_channel_full(i))
    }

    /// Sum of each channel's average (integer division per channel).
    pub fn total_kg(&self) -> u32 {
        self.channels
            .iter()
            .map(|c| c.sum_kg / self.target)
            .fold(0u32, u32::saturating_add)
    }
}

pub struct WeighingController {
    phase: WeighPhase,
    acc: WeightAccumulator,
    channels: [u8; 2],
    calibration: LoadCellCalibration,
    approach_peak: PeakSpeed,
    cycle_peak: f32,
    pending: Option<WeighResult>,
    // Set after a completed cycle; cleared once the estimate stops reading 0.
    await_departure: bool,
    read_failures: u32,
}

impl WeighingController {
    pub fn new(channels: [u8; 2], calibration: LoadCellCalibration) -> Self {
        Self::with_target(channels, calibration, SAMPLES_PER_CHANNEL)
    }

    pub fn with_target(channels: [u8; 2], calibration: LoadCellCalibration, target: u32) -> Self {
        Self {
            phase: WeighPhase::Idle,
            acc: WeightAccumulator::new(target),
            channels,
            calibration,
            approach_peak: PeakSpeed::default(),
            cycle_peak: 0.0,
            pending: None,
            await_departure: false,
            read_failures: 0,
        }
    }

    pub fn phase(&self) -> WeighPhase {
        self.phase
    }

    pub fn accumulator(&self) -> &WeightAccumulator {
        &self.acc
    }

    /// Peak approach speed tracked for the next cycle.
    pub fn approach_peak(&self) -> f32 {
        self.approach_peak.get()
    }

    /// Advance one tick with the current flags and speed estimate.
    pub fn tick<A: AnalogInput + ?Sized>(
        &mut self,
        state: StateSnapshot,
        speed: Option<f32>,
        adc: &mut A,
    ) -> WeighEvent {
        if self.phase == WeighPhase::Reporting {
            return self.pending.map_or(WeighEvent::Idle, WeighEvent::Completed);
        }

        if !state.armed {
            self.approach_peak.reset();
            self.await_departure = false;
            if self.phase == WeighPhase::Sampling {
                self.phase = WeighPhase::Idle;
                self.acc.reset();
                return WeighEvent::Aborted;
            }
            return WeighEvent::Idle;
        }

        let started = if self.phase == WeighPhase::Idle {
            let stopped = speed == Some(0.0);
            if self.await_departure {
                if stopped {
                    return WeighEvent::Idle;
                }
                self.await_departure = false;
            }
            self.approach_peak.observe(speed);
            if !stopped {
                return WeighEvent::Idle;
            }
            self.begin_cycle();
            true
        } else {
            false
        };

        self.acquire(adc);

        if self.acc.is_complete() {
            return self.finish();
        }
        if started {
            WeighEvent::Started
        } else {
            WeighEvent::Sampling {
                channel_1: self.acc.channel(0).count,
                channel_2: self.acc.channel(1).count,
            }
        }
    }

    /// Acknowledge that the pending result reached the reporting channel.
    pub fn reported(&mut self) {
        if self.phase == WeighPhase::Reporting {
            self.pending = None;
            self.phase = WeighPhase::Idle;
        }
    }

    fn begin_cycle(&mut self) {
        self.acc.reset();
        self.read_failures = 0;
        self.cycle_peak = self.approach_peak.take();
        self.phase = WeighPhase::Sampling;
    }

    // Sequential reads: channel 1 then channel 2, skipping full channels.
    fn acquire<A: AnalogInput + ?Sized>(&mut self, adc: &mut A) {
        for idx in 0..self.channels.len() {
            if self.acc.is_channel_full(idx) {
                continue;
            }
            let ch = self.channels[idx];
            match adc.read_channel(ch) {
                Ok(mv) => {
                    let kg = self.calibration.to_kg(mv);
                    self.acc.add(idx, kg);
                }
                Err(e) => {
                    self.read_failures += 1;
                    let err = map_hw_error(e.as_ref());
                    tracing::debug!(channel = ch, error = %err, "load-cell read failed; sample skipped");
                }
            }
        }
    }

    fn finish(&mut self) -> WeighEvent {
        let result = WeighResult {
            weight_kg: self.acc.total_kg(),
            max_speed_mps: self.cycle_peak,
        };
        if self.read_failures > 0 {
            tracing::debug!(failures = self.read_failures, "cycle completed with skipped samples");
        }
        self.phase = WeighPhase::Reporting;
        self.pending = Some(result);
        self.await_departure = true;
        WeighEvent::Completed(result)
    }
}

/// Weighing task body: block on the tick channel, advance the controller once
/// per tick, and hand completed results to the reporter. Exits when the tick
/// source is dropped or shutdown is requested.
pub(crate) fn run<A: AnalogInput>(
    mut ctrl: WeighingController,
    mut adc: A,
    ticks: xch::Receiver<()>,
    shared: Arc<Shared>,
    reports: xch::Sender<WeighResult>,
) {
    while ticks.recv().is_ok() {
        if shared.is_shutdown() {
            break;
        }
        let state = shared.state.snapshot();
        let speed = shared.speed.load();
        match ctrl.tick(state, speed, &mut adc) {
            WeighEvent::Started => {
                tracing::info!(
                    approach_peak_mps = ctrl.cycle_peak,
                    "vehicle stopped, weighing started"
                );
            }
            WeighEvent::Completed(result) => {
                shared.set_phase(WeighPhase::Reporting);
                match reports.try_send(result) {
                    Ok(()) => {
                        ctrl.reported();
                        shared.count_completed();
                        tracing::info!(
                            weight_kg = result.weight_kg,
                            max_speed_mps = result.max_speed_mps,
                            "weighing complete"
                        );
                    }
                    Err(xch::TrySendError::Full(_)) => {
                        tracing::warn!("reporter busy; retrying next tick");
                    }
                    Err(xch::TrySendError::Disconnected(_)) => {
                        tracing::debug!("reporter gone, weighing task exiting");
                        break;
                    }
                }
            }
            WeighEvent::Aborted => {
                shared.count_aborted();
                tracing::warn!("station disarmed mid-cycle; weighing aborted");
            }
            WeighEvent::Idle | WeighEvent::Sampling { .. } => {}
        }
        shared.set_phase(ctrl.phase());
    }
    tracing::trace!("weighing task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FixedAnalog;

    const ARMED: StateSnapshot = StateSnapshot {
        armed: true,
        barrier_open: true,
        off: false,
    };

    fn ctrl() -> WeighingController {
        WeighingController::new([1, 2], LoadCellCalibration::default())
    }

    #[test]
    fn accumulator_refuses_past_target() {
        let mut acc = WeightAccumulator::new(2);
        assert!(acc.add(0, 10));
        assert!(acc.add(0, 10));
        assert!(!acc.add(0, 10));
        assert_eq!(acc.channel(0), ChannelSum { sum_kg: 20, count: 2 });
        assert!(!acc.is_complete());
    }

    #[test]
    fn total_averages_each_channel_sum() {
        let mut acc = WeightAccumulator::new(2);
        acc.add(0, 100);
        acc.add(0, 200);
        acc.add(1, 7);
        acc.add(1, 8);
        // 300/2 + 15/2 = 150 + 7
        assert_eq!(acc.total_kg(), 157);
    }

    #[test]
    fn waits_for_exact_zero_speed() {
        let mut c = ctrl();
        let mut adc = FixedAnalog::new([(1, 1650), (2, 1650)]);
        assert_eq!(c.tick(ARMED, None, &mut adc), WeighEvent::Idle);
        assert_eq!(c.tick(ARMED, Some(0.5), &mut adc), WeighEvent::Idle);
        assert_eq!(c.tick(ARMED, Some(0.0), &mut adc), WeighEvent::Started);
        assert_eq!(c.phase(), WeighPhase::Sampling);
    }

    #[test]
    fn disarmed_never_starts() {
        let mut c = ctrl();
        let mut adc = FixedAnalog::new([(1, 1650), (2, 1650)]);
        for _ in 0..10 {
            assert_eq!(
                c.tick(StateSnapshot::default(), Some(0.0), &mut adc),
                WeighEvent::Idle
            );
        }
    }

    #[test]
    fn reporting_holds_result_until_acknowledged() {
        let mut c = WeighingController::with_target([1, 2], LoadCellCalibration::default(), 1);
        let mut adc = FixedAnalog::new([(1, 3300), (2, 0)]);
        let expect = WeighResult {
            weight_kg: 20_000,
            max_speed_mps: 0.0,
        };
        assert_eq!(
            c.tick(ARMED, Some(0.0), &mut adc),
            WeighEvent::Completed(expect)
        );
        assert_eq!(c.phase(), WeighPhase::Reporting);
        assert_eq!(
            c.tick(ARMED, Some(0.0), &mut adc),
            WeighEvent::Completed(expect)
        );
        c.reported();
        assert_eq!(c.phase(), WeighPhase::Idle);
    }

    #[test]
    fn stays_idle_until_vehicle_moves_again() {
        let mut c = WeighingController::with_target([1, 2], LoadCellCalibration::default(), 1);
        let mut adc = FixedAnalog::new([(1, 1650), (2, 1650)]);
        assert!(matches!(
            c.tick(ARMED, Some(0.0), &mut adc),
            WeighEvent::Completed(_)
        ));
        c.reported();
        assert_eq!(c.tick(ARMED, Some(0.0), &mut adc), WeighEvent::Idle);
        assert_eq!(c.tick(ARMED, None, &mut adc), WeighEvent::Idle);
        assert!(matches!(
            c.tick(ARMED, Some(0.0), &mut adc),
            WeighEvent::Completed(_)
        ));
    }

    #[test]
    fn cycle_peak_comes_from_approach() {
        let mut c = WeighingController::with_target([1, 2], LoadCellCalibration::default(), 1);
        let mut adc = FixedAnalog::new([(1, 0), (2, 0)]);
        c.tick(ARMED, Some(9.0), &mut adc);
        c.tick(ARMED, Some(12.5), &mut adc);
        c.tick(ARMED, Some(3.0), &mut adc);
        assert_eq!(c.approach_peak(), 12.5);
        match c.tick(ARMED, Some(0.0), &mut adc) {
            WeighEvent::Completed(r) => assert_eq!(r.max_speed_mps, 12.5),
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(c.approach_peak(), 0.0);
    }

    #[test]
    fn failed_channel_read_delays_completion() {
        let mut c = WeighingController::with_target([1, 2], LoadCellCalibration::default(), 2);
        let adc = FixedAnalog::new([(1, 1650), (2, 1650)]);
        let mut reader = adc.clone();
        adc.set_failing(2, true);
        assert_eq!(c.tick(ARMED, Some(0.0), &mut reader), WeighEvent::Started);
        assert_eq!(
            c.tick(ARMED, Some(0.0), &mut reader),
            WeighEvent::Sampling {
                channel_1: 2,
                channel_2: 0
            }
        );
        adc.set_failing(2, false);
        assert_eq!(
            c.tick(ARMED, Some(0.0), &mut reader),
            WeighEvent::Sampling {
                channel_1: 2,
                channel_2: 1
            }
        );
        match c.tick(ARMED, Some(0.0), &mut reader) {
            WeighEvent::Completed(r) => assert_eq!(r.weight_kg, 20_000),
            other => panic!("expected Completed, got {other:?}"),
        }
    }
}

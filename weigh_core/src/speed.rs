//! Vehicle speed from successive range samples.
//!
//! Positive speed means the vehicle is approaching (distance decreasing).

use std::time::Duration;

use crate::sample::DistanceSample;
use crate::timing::{APPROACH_GATE_CM, distance_period};

/// Speed in m/s between two readings taken `dt_s` seconds apart.
///
/// Undefined (`None`) when the current reading is outside the approach gate or
/// `dt_s` is not a positive interval.
#[inline]
pub fn estimate_mps(previous_cm: u16, current_cm: u16, dt_s: f32) -> Option<f32> {
    if current_cm >= APPROACH_GATE_CM || !(dt_s > 0.0) {
        return None;
    }
    let delta_cm = i32::from(previous_cm) - i32::from(current_cm);
    Some(delta_cm as f32 / 100.0 / dt_s)
}

/// Keeps exactly one previous sample and derives speed from it.
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    previous: Option<DistanceSample>,
    interval: Duration,
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self::with_interval(distance_period())
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            previous: None,
            interval,
        }
    }

    /// Feed a sample taken one period after the previous one.
    pub fn update(&mut self, current: DistanceSample) -> Option<f32> {
        self.update_after(current, 1)
    }

    /// Feed a sample taken `periods` sampling periods after the previous one
    /// (more than one when reads failed in between).
    ///
    /// Δt is the fixed interval times `periods`. Timestamps never enter the
    /// formula, so a slow read does not stretch Δt.
    pub fn update_after(&mut self, current: DistanceSample, periods: u32) -> Option<f32> {
        let estimate = self.previous.and_then(|prev| {
            let dt_s = self.interval.as_secs_f32() * periods.max(1) as f32;
            estimate_mps(prev.distance_cm, current.distance_cm, dt_s)
        });
        self.previous = Some(current);
        estimate
    }

    /// Forget the previous sample (used when the station is disarmed).
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<DistanceSample> {
        self.previous
    }
}

/// Highest approach speed seen since the last `take()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakSpeed {
    peak: Option<f32>,
}

impl PeakSpeed {
    pub fn observe(&mut self, speed: Option<f32>) {
        if let Some(v) = speed.filter(|v| *v > 0.0) {
            self.peak = Some(self.peak.map_or(v, |p| p.max(v)));
        }
    }

    pub fn get(&self) -> f32 {
        self.peak.unwrap_or(0.0)
    }

    /// Return the peak (0 if none) and start a new window.
    pub fn take(&mut self) -> f32 {
        self.peak.take().unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        self.peak = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(ts: u64, cm: u16) -> DistanceSample {
        DistanceSample {
            timestamp_ms: ts,
            distance_cm: cm,
        }
    }

    #[test]
    fn first_sample_has_no_estimate() {
        let mut est = SpeedEstimator::new();
        assert_eq!(est.update(s(0, 900)), None);
        assert_eq!(est.previous(), Some(s(0, 900)));
    }

    #[test]
    fn approaching_is_positive() {
        let mut est = SpeedEstimator::new();
        est.update(s(0, 900));
        // 100 cm in 100 ms = 10 m/s
        assert_eq!(est.update(s(100, 800)), Some(10.0));
    }

    #[test]
    fn receding_is_negative() {
        let mut est = SpeedEstimator::new();
        est.update(s(0, 500));
        assert_eq!(est.update(s(100, 550)), Some(-5.0));
    }

    #[test]
    fn estimates_from_latest_previous_only() {
        let mut est = SpeedEstimator::new();
        est.update(s(0, 990));
        est.update(s(100, 900));
        assert_eq!(est.update(s(200, 890)), Some(1.0));
    }

    #[test]
    fn outside_gate_is_undefined() {
        let mut est = SpeedEstimator::new();
        est.update(s(0, 1200));
        assert_eq!(est.update(s(100, 1000)), None);
        let v = est.update(s(200, 999)).unwrap();
        assert!((v - 0.1).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn skipped_read_spans_two_periods() {
        let mut est = SpeedEstimator::new();
        est.update(s(0, 900));
        assert_eq!(est.update_after(s(200, 700), 2), Some(10.0));
    }

    #[test]
    fn late_timestamp_does_not_stretch_interval() {
        // a 60 ms echo puts the second sample 160 ms after the first
        let mut est = SpeedEstimator::new();
        est.update(s(60, 990));
        assert_eq!(est.update(s(220, 890)), Some(10.0));
    }

    #[test]
    fn reset_drops_previous() {
        let mut est = SpeedEstimator::new();
        est.update(s(0, 900));
        est.reset();
        assert_eq!(est.update(s(100, 800)), None);
    }

    #[test]
    fn peak_tracks_positive_max_and_resets() {
        let mut p = PeakSpeed::default();
        p.observe(None);
        p.observe(Some(-12.0));
        assert_eq!(p.get(), 0.0);
        p.observe(Some(6.0));
        p.observe(Some(11.5));
        p.observe(Some(3.0));
        assert_eq!(p.take(), 11.5);
        assert_eq!(p.get(), 0.0);
    }
}

//! Background distance sampling.
//!
//! Owns the range sensor. While the station is armed it takes one reading per
//! period, publishes it with a timestamp and republishes the speed estimate.
//! Sampling is suspended while disarmed; the previous sample is discarded at
//! that point so a re-arm never derives speed across the gap.
//!
//! Each `DistanceSampler` owns exactly one thread, joined on drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use weigh_traits::RangeSensor;
use weigh_traits::clock::Clock;

use crate::error::{InitError, SensorError};
use crate::hw_error::map_hw_error;
use crate::sample::DistanceSample;
use crate::shared::Shared;
use crate::speed::SpeedEstimator;
use crate::timing::distance_period;

pub struct DistanceSampler {
    shutdown: Arc<AtomicBool>,
    failures: Arc<AtomicU64>,
    join_handle: Option<JoinHandle<()>>,
}

impl DistanceSampler {
    /// Spawn with the fixed distance period.
    pub fn spawn<S, C>(sensor: S, shared: Arc<Shared>, clock: C) -> Result<Self, InitError>
    where
        S: RangeSensor + Send + 'static,
        C: Clock + Send + 'static,
    {
        Self::spawn_with_period(sensor, shared, clock, distance_period())
    }

    pub fn spawn_with_period<S, C>(
        mut sensor: S,
        shared: Arc<Shared>,
        clock: C,
        period: Duration,
    ) -> Result<Self, InitError>
    where
        S: RangeSensor + Send + 'static,
        C: Clock + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let failures = Arc::new(AtomicU64::new(0));
        let shutdown_t = shutdown.clone();
        let failures_t = failures.clone();
        let epoch = clock.now();

        let join_handle = std::thread::Builder::new()
            .name("weigh-distance".into())
            .spawn(move || {
                let mut estimator = SpeedEstimator::with_interval(period);
                let mut was_armed = false;
                // Periods since the last good sample, minus one.
                let mut missed: u32 = 0;
                let mut next = clock.now();
                loop {
                    if shutdown_t.load(Ordering::Relaxed) || shared.is_shutdown() {
                        tracing::debug!("distance sampler received shutdown signal");
                        break;
                    }

                    if shared.state.is_armed() {
                        was_armed = true;
                        match sensor.read_distance_cm() {
                            Ok(cm) => {
                                let sample = DistanceSample {
                                    timestamp_ms: clock.ms_since(epoch),
                                    distance_cm: cm,
                                };
                                shared.sample.publish(sample);
                                let speed = estimator.update_after(sample, missed.saturating_add(1));
                                missed = 0;
                                shared.speed.publish(speed);
                                tracing::debug!(distance_cm = cm, speed_mps = ?speed, "distance sample");
                            }
                            Err(e) => {
                                failures_t.fetch_add(1, Ordering::Relaxed);
                                missed = missed.saturating_add(1);
                                match map_hw_error(e.as_ref()) {
                                    SensorError::Timeout => {
                                        tracing::debug!("range read timed out; keeping previous sample");
                                    }
                                    other => {
                                        tracing::debug!(error = %other, "range read failed; keeping previous sample");
                                    }
                                }
                            }
                        }
                    } else if was_armed {
                        was_armed = false;
                        estimator.reset();
                        missed = 0;
                        shared.sample.clear();
                        shared.speed.publish(None);
                        tracing::debug!("sampling suspended while disarmed");
                    }

                    if shutdown_t.load(Ordering::Relaxed) || shared.is_shutdown() {
                        break;
                    }
                    // Reads start on a fixed grid; an overrun restarts the grid.
                    next += period;
                    let now = clock.now();
                    if next > now {
                        clock.sleep_until(next);
                    } else {
                        next = now;
                    }
                }
                tracing::trace!("distance sampler exiting cleanly");
            })
            .map_err(|e| InitError::Spawn(e.to_string()))?;

        Ok(Self {
            shutdown,
            failures,
            join_handle: Some(join_handle),
        })
    }

    /// Count of failed range reads since spawn.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Stop sampling and join the thread. Idempotent.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("distance sampler joined"),
                Err(e) => tracing::warn!(?e, "distance sampler panicked during shutdown"),
            }
        }
    }
}

impl Drop for DistanceSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

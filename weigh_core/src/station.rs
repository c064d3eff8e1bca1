//! Station assembly: collect hardware parts, validate, then spawn the tasks.
//!
//! `StationBuilder::build` performs every check and the initial output drive
//! (barrier closed, indicators off) before any thread exists, so an
//! `InitError` never leaves a half-started station behind. `Station::start`
//! spawns the tasks and returns a `StationHandle` that joins them on drop.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel as xch;
use weigh_traits::clock::{Clock, MonotonicClock};
use weigh_traits::{AnalogInput, DigitalOutput, RangeSensor, SerialRx, SerialTx};

use crate::advisory::{self, AdvisoryController};
use crate::calibration::LoadCellCalibration;
use crate::command::CommandChannel;
use crate::config::StationCfg;
use crate::error::InitError;
use crate::report;
use crate::sampler::DistanceSampler;
use crate::shared::Shared;
use crate::status::StationStatus;
use crate::ticker::{TickSource, TickStats, TickStatsSnapshot};
use crate::timing::weigh_period;
use crate::weighing::{self, WeighResult, WeighingController};

pub type BoxedRangeSensor = Box<dyn RangeSensor + Send>;
pub type BoxedAnalogInput = Box<dyn AnalogInput + Send>;
pub type BoxedOutput = Box<dyn DigitalOutput + Send>;
pub type BoxedSerialTx = Box<dyn SerialTx + Send>;
pub type BoxedSerialRx = Box<dyn SerialRx + Send>;

pub struct StationBuilder<C = MonotonicClock> {
    range: Option<BoxedRangeSensor>,
    adc: Option<BoxedAnalogInput>,
    indicators: Option<[BoxedOutput; 3]>,
    barrier: Option<BoxedOutput>,
    serial: Option<(BoxedSerialTx, BoxedSerialRx)>,
    cfg: StationCfg,
    calibration: LoadCellCalibration,
    clock: C,
}

impl Default for StationBuilder<MonotonicClock> {
    fn default() -> Self {
        Self {
            range: None,
            adc: None,
            indicators: None,
            barrier: None,
            serial: None,
            cfg: StationCfg::default(),
            calibration: LoadCellCalibration::default(),
            clock: MonotonicClock::new(),
        }
    }
}

impl<C> StationBuilder<C>
where
    C: Clock + Clone + Send + 'static,
{
    pub fn with_range_sensor(mut self, s: impl RangeSensor + Send + 'static) -> Self {
        self.range = Some(Box::new(s));
        self
    }

    pub fn with_analog_input(mut self, a: impl AnalogInput + Send + 'static) -> Self {
        self.adc = Some(Box::new(a));
        self
    }

    /// Indicators in advisory order: stopped, moderate, high.
    pub fn with_indicators(
        mut self,
        stopped: impl DigitalOutput + Send + 'static,
        moderate: impl DigitalOutput + Send + 'static,
        high: impl DigitalOutput + Send + 'static,
    ) -> Self {
        self.indicators = Some([Box::new(stopped), Box::new(moderate), Box::new(high)]);
        self
    }

    pub fn with_barrier(mut self, o: impl DigitalOutput + Send + 'static) -> Self {
        self.barrier = Some(Box::new(o));
        self
    }

    pub fn with_serial(
        mut self,
        tx: impl SerialTx + Send + 'static,
        rx: impl SerialRx + Send + 'static,
    ) -> Self {
        self.serial = Some((Box::new(tx), Box::new(rx)));
        self
    }

    pub fn with_config(mut self, cfg: StationCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_calibration(mut self, calibration: LoadCellCalibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// Swap the clock driving every periodic task.
    pub fn with_clock<C2>(self, clock: C2) -> StationBuilder<C2>
    where
        C2: Clock + Clone + Send + 'static,
    {
        StationBuilder {
            range: self.range,
            adc: self.adc,
            indicators: self.indicators,
            barrier: self.barrier,
            serial: self.serial,
            cfg: self.cfg,
            calibration: self.calibration,
            clock,
        }
    }

    pub fn build(self) -> Result<Station<C>, InitError> {
        self.cfg.validate()?;
        let range = self.range.ok_or(InitError::MissingRangeSensor)?;
        let adc = self.adc.ok_or(InitError::MissingAnalogInput)?;
        let [stopped, moderate, high] = self.indicators.ok_or(InitError::MissingIndicators)?;
        let mut barrier = self.barrier.ok_or(InitError::MissingBarrier)?;
        let (serial_tx, serial_rx) = self.serial.ok_or(InitError::MissingSerial)?;

        barrier
            .set_low()
            .map_err(|e| InitError::Output(format!("barrier: {e}")))?;
        let mut advisory = AdvisoryController::new(stopped, moderate, high);
        advisory
            .all_off()
            .map_err(|e| InitError::Output(e.to_string()))?;

        tracing::debug!(channels = ?self.cfg.load_cell_channels, "station built");
        Ok(Station {
            range,
            adc,
            advisory,
            barrier,
            serial_tx,
            serial_rx,
            cfg: self.cfg,
            calibration: self.calibration,
            clock: self.clock,
            shared: Arc::new(Shared::new()),
        })
    }
}

/// A fully validated station whose tasks have not started yet.
pub struct Station<C = MonotonicClock> {
    range: BoxedRangeSensor,
    adc: BoxedAnalogInput,
    advisory: AdvisoryController<BoxedOutput>,
    barrier: BoxedOutput,
    serial_tx: BoxedSerialTx,
    serial_rx: BoxedSerialRx,
    cfg: StationCfg,
    calibration: LoadCellCalibration,
    clock: C,
    shared: Arc<Shared>,
}

impl Station<MonotonicClock> {
    pub fn builder() -> StationBuilder<MonotonicClock> {
        StationBuilder::default()
    }
}

impl<C> Station<C>
where
    C: Clock + Clone + Send + 'static,
{
    pub fn config(&self) -> &StationCfg {
        &self.cfg
    }

    pub fn shared(&self) -> Arc<Shared> {
        self.shared.clone()
    }

    pub fn status(&self) -> StationStatus {
        snapshot(&self.shared)
    }

    /// Spawn every task, then attach the command channel as the serial
    /// receiver's byte callback. On failure the tasks already started are
    /// stopped and joined before the error is returned.
    pub fn start(self) -> Result<StationHandle, InitError> {
        let shared = self.shared;
        let mut handle = StationHandle {
            shared: shared.clone(),
            tasks: Vec::new(),
            ticker: None,
            tick_stats: Arc::new(TickStats::default()),
            sampler: None,
        };

        let (report_tx, report_rx) = xch::bounded::<WeighResult>(1);
        let serial_tx = self.serial_tx;
        handle.spawn("weigh-report", move || report::run(serial_tx, report_rx))?;

        let (ticker, ticks) = TickSource::spawn(weigh_period(), self.clock.clone())?;
        handle.tick_stats = ticker.stats();
        handle.ticker = Some(ticker);

        let ctrl = WeighingController::new(self.cfg.load_cell_channels, self.calibration);
        let adc = self.adc;
        let weigh_shared = shared.clone();
        handle.spawn("weigh-cycle", move || {
            weighing::run(ctrl, adc, ticks, weigh_shared, report_tx);
        })?;

        handle.sampler = Some(DistanceSampler::spawn(
            self.range,
            shared.clone(),
            self.clock.clone(),
        )?);

        let adv = self.advisory;
        let adv_shared = shared.clone();
        let adv_clock = self.clock.clone();
        handle.spawn("weigh-advisory", move || advisory::run(adv, adv_shared, adv_clock))?;

        let channel = CommandChannel::new(self.barrier, shared);
        let mut rx = self.serial_rx;
        rx.attach(channel.into_sink())
            .map_err(|e| InitError::Serial(e.to_string()))?;

        tracing::info!("station started");
        Ok(handle)
    }
}

fn snapshot(shared: &Shared) -> StationStatus {
    let state = shared.state.snapshot();
    StationStatus {
        armed: state.armed,
        barrier_open: state.barrier_open,
        distance_cm: shared.sample.latest().map(|s| s.distance_cm),
        speed_mps: shared.speed.load(),
        advisory: shared.advisory(),
        phase: shared.phase(),
        cycles_completed: shared.cycles_completed(),
        cycles_aborted: shared.cycles_aborted(),
    }
}

/// Running station. Dropping it stops and joins every task.
pub struct StationHandle {
    shared: Arc<Shared>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    ticker: Option<TickSource>,
    tick_stats: Arc<TickStats>,
    sampler: Option<DistanceSampler>,
}

impl StationHandle {
    fn spawn(
        &mut self,
        name: &'static str,
        f: impl FnOnce() + Send + 'static,
    ) -> Result<(), InitError> {
        let h = std::thread::Builder::new()
            .name(name.into())
            .spawn(f)
            .map_err(|e| InitError::Spawn(format!("{name}: {e}")))?;
        self.tasks.push((name, h));
        Ok(())
    }

    pub fn status(&self) -> StationStatus {
        snapshot(&self.shared)
    }

    pub fn tick_stats(&self) -> TickStatsSnapshot {
        self.tick_stats.snapshot()
    }

    pub fn shared(&self) -> Arc<Shared> {
        self.shared.clone()
    }

    /// Failed range reads since start.
    pub fn range_failures(&self) -> u64 {
        self.sampler.as_ref().map_or(0, DistanceSampler::failures)
    }

    pub fn shutdown(mut self) {
        self.stop_all();
    }

    fn stop_all(&mut self) {
        if self.tasks.is_empty() && self.ticker.is_none() && self.sampler.is_none() {
            return;
        }
        self.shared.request_shutdown();
        // Stopping the ticker disconnects the weighing task, which in turn
        // releases the reporter.
        if let Some(mut t) = self.ticker.take() {
            t.stop();
        }
        if let Some(mut s) = self.sampler.take() {
            s.stop();
        }
        for (name, h) in self.tasks.drain(..) {
            match h.join() {
                Ok(()) => tracing::trace!(task = name, "task joined"),
                Err(e) => tracing::warn!(task = name, ?e, "task panicked during shutdown"),
            }
        }
        tracing::info!("station stopped");
    }
}

impl Drop for StationHandle {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ChannelSerial, FixedAnalog, NoopRangeSensor, RecordingOutput};

    fn full_builder() -> StationBuilder {
        let (tx, rx, _inject, _lines) = ChannelSerial::pair();
        Station::builder()
            .with_range_sensor(NoopRangeSensor)
            .with_analog_input(FixedAnalog::new([(1, 0), (2, 0)]))
            .with_indicators(
                RecordingOutput::new("led1"),
                RecordingOutput::new("led2"),
                RecordingOutput::new("led3"),
            )
            .with_barrier(RecordingOutput::new("barrier"))
            .with_serial(tx, rx)
    }

    #[test]
    fn missing_parts_are_reported() {
        assert!(matches!(
            Station::builder().build(),
            Err(InitError::MissingRangeSensor)
        ));
        assert!(matches!(
            Station::builder().with_range_sensor(NoopRangeSensor).build(),
            Err(InitError::MissingAnalogInput)
        ));
    }

    #[test]
    fn invalid_config_fails_before_parts_check() {
        let r = Station::builder()
            .with_config(StationCfg {
                load_cell_channels: [1, 1],
            })
            .build();
        assert!(matches!(r, Err(InitError::InvalidConfig(_))));
    }

    #[test]
    fn build_closes_barrier_and_clears_indicators() {
        let log = RecordingOutput::shared_log();
        let (tx, rx, _inject, _lines) = ChannelSerial::pair();
        let station = Station::builder()
            .with_range_sensor(NoopRangeSensor)
            .with_analog_input(FixedAnalog::default())
            .with_indicators(
                RecordingOutput::named("led1", &log),
                RecordingOutput::named("led2", &log),
                RecordingOutput::named("led3", &log),
            )
            .with_barrier(RecordingOutput::named("barrier", &log))
            .with_serial(tx, rx)
            .build()
            .unwrap();
        assert_eq!(
            RecordingOutput::events(&log),
            vec![
                ("barrier", false),
                ("led1", false),
                ("led2", false),
                ("led3", false)
            ]
        );
        let st = station.status();
        assert!(!st.armed && !st.barrier_open);
        assert_eq!(st.advisory, None);
    }

    #[test]
    fn start_and_shutdown_join_everything() {
        let station = full_builder().build().unwrap();
        let shared = station.shared();
        let handle = station.start().unwrap();
        assert!(!handle.status().armed);
        handle.shutdown();
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}

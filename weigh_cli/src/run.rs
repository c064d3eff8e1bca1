//! Subcommand implementations: device assembly, `run`, `self-check`, `health`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use weigh_config::Config;
use weigh_core::hw_error::map_hw_error;
use weigh_core::station::{BoxedAnalogInput, BoxedOutput, BoxedRangeSensor};
use weigh_core::{LoadCellCalibration, Station, StationCfg, StationStatus};
use weigh_hardware::{ReaderRx, SimulatedLoadCells, WriterTx};
use weigh_traits::{AnalogInput, DigitalOutput, RangeSensor};

use crate::rt::setup_rt_once;

/// How often `run` wakes to check the deadline and the interrupt flag.
const SUPERVISE_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOpts {
    pub duration_ms: Option<u64>,
    pub stats: bool,
    pub rt: bool,
    pub rt_prio: Option<i32>,
}

/// Every device the station needs apart from the serial link.
struct Devices {
    range: BoxedRangeSensor,
    adc: BoxedAnalogInput,
    stopped: BoxedOutput,
    moderate: BoxedOutput,
    high: BoxedOutput,
    barrier: BoxedOutput,
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_devices(cfg: &Config) -> eyre::Result<Devices> {
    use weigh_hardware::{SimulatedOutput, SimulatedRangeSensor};

    let sim = &cfg.simulation;
    let range = SimulatedRangeSensor::new(sim.start_cm, sim.stop_cm, sim.approach_speed_mps)
        .with_failures_every(sim.range_fail_every);
    tracing::debug!(
        start_cm = sim.start_cm,
        stop_cm = sim.stop_cm,
        speed_mps = sim.approach_speed_mps,
        "simulated vehicle"
    );
    Ok(Devices {
        range: Box::new(range),
        adc: sim_load_cells(cfg),
        stopped: Box::new(SimulatedOutput::new("led_stopped")),
        moderate: Box::new(SimulatedOutput::new("led_moderate")),
        high: Box::new(SimulatedOutput::new("led_high")),
        barrier: Box::new(SimulatedOutput::new("barrier")),
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_devices(cfg: &Config) -> eyre::Result<Devices> {
    use weigh_hardware::gpio::{self, GpioOutput, HcSr04};

    let gpio = gpio::open().wrap_err("opening GPIO")?;
    let pins = &cfg.pins;
    let range = HcSr04::new(
        &gpio,
        pins.trigger,
        pins.echo,
        Duration::from_millis(cfg.hardware.sensor_read_timeout_ms),
    )
    .wrap_err("configuring HC-SR04")?;
    let out = |pin: u8, name: &str| -> eyre::Result<BoxedOutput> {
        let o = GpioOutput::new(&gpio, pin).wrap_err_with(|| format!("configuring {name}"))?;
        Ok(Box::new(o))
    };
    Ok(Devices {
        range: Box::new(range),
        // No ADC driver ships yet; load cells stay simulated on real hardware.
        adc: sim_load_cells(cfg),
        stopped: out(pins.led_stopped, "pins.led_stopped")?,
        moderate: out(pins.led_moderate, "pins.led_moderate")?,
        high: out(pins.led_high, "pins.led_high")?,
        barrier: out(pins.barrier, "pins.barrier")?,
    })
}

fn sim_load_cells(cfg: &Config) -> BoxedAnalogInput {
    let [mv1, mv2] = cfg.simulation.load_cell_mv;
    Box::new(SimulatedLoadCells::new([
        (cfg.channels.load_cell_1, mv1),
        (cfg.channels.load_cell_2, mv2),
    ]))
}

fn build_station(cfg: &Config, serial_rx: ReaderRx) -> eyre::Result<Station> {
    let dev = open_devices(cfg)?;
    let station = Station::builder()
        .with_config(StationCfg::from(cfg))
        .with_calibration(LoadCellCalibration::default())
        .with_range_sensor(dev.range)
        .with_analog_input(dev.adc)
        .with_indicators(dev.stopped, dev.moderate, dev.high)
        .with_barrier(dev.barrier)
        .with_serial(WriterTx::stdout(cfg.serial.baud_rate), serial_rx)
        .build()?;
    Ok(station)
}

pub fn run(cfg: &Config, opts: RunOpts) -> eyre::Result<()> {
    setup_rt_once(opts.rt, opts.rt_prio);

    let station = build_station(cfg, ReaderRx::stdin())?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .wrap_err("installing Ctrl-C handler")?;
    }

    let handle = station.start()?;
    tracing::info!(
        baud = cfg.serial.baud_rate,
        duration_ms = ?opts.duration_ms,
        "weigh station running; 'O' toggles arming and opens the barrier, 'C' closes it"
    );

    let deadline = opts
        .duration_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));
    loop {
        if interrupted.load(Ordering::SeqCst) {
            tracing::info!("interrupted");
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        std::thread::sleep(SUPERVISE_POLL);
    }

    let status = handle.status();
    let ticks = handle.tick_stats();
    let range_failures = handle.range_failures();
    handle.shutdown();

    if opts.stats {
        eprintln!(
            "ticks delivered={} coalesced={} max_late_us={}",
            ticks.delivered, ticks.coalesced, ticks.max_late_us
        );
    }
    tracing::info!(
        cycles_completed = status.cycles_completed,
        cycles_aborted = status.cycles_aborted,
        range_failures,
        "weigh station stopped"
    );
    Ok(())
}

pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let mut dev = open_devices(cfg)?;

    let cm = dev
        .range
        .read_distance_cm()
        .map_err(|e| map_hw_error(&*e))
        .wrap_err("range sensor")?;
    tracing::info!(distance_cm = cm, "range sensor ok");

    for ch in [cfg.channels.load_cell_1, cfg.channels.load_cell_2] {
        let mv = dev
            .adc
            .read_channel(ch)
            .map_err(|e| map_hw_error(&*e))
            .wrap_err_with(|| format!("load cell channel {ch}"))?;
        tracing::info!(channel = ch, mv, "load cell ok");
    }

    for (name, out) in [
        ("led_stopped", &mut dev.stopped),
        ("led_moderate", &mut dev.moderate),
        ("led_high", &mut dev.high),
        ("barrier", &mut dev.barrier),
    ] {
        out.set_high()
            .and_then(|()| out.set_low())
            .map_err(|e| eyre::eyre!("{name}: {e}"))?;
        tracing::info!(output = name, "output ok");
    }

    println!("self-check ok");
    Ok(())
}

pub fn health(cfg: &Config) -> eyre::Result<()> {
    let station = build_station(cfg, ReaderRx::new(std::io::empty()))?;
    let channels = station.config().load_cell_channels;
    println!("{}", health_json(&station.status(), channels));
    Ok(())
}

fn health_json(s: &StationStatus, channels: [u8; 2]) -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "armed": s.armed,
        "barrier_open": s.barrier_open,
        "distance_cm": s.distance_cm,
        "speed_mps": s.speed_mps,
        "advisory": s.advisory.map(weigh_core::AdvisoryLevel::as_str),
        "phase": s.phase.as_str(),
        "cycles_completed": s.cycles_completed,
        "cycles_aborted": s.cycles_aborted,
        "channels": channels,
    })
}

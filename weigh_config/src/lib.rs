#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the weigh station.
//!
//! Every section has defaults matching the reference board wiring, so an
//! empty file is a valid config. `Config::validate` catches values that parse
//! but cannot work (shared pins, zero baud rate, inverted simulation range).
//! Sampling periods and thresholds live in `weigh_core::timing` and are not
//! configurable.
use std::path::Path;

use eyre::WrapErr;
use serde::Deserialize;

/// Full-scale load-cell input in millivolts.
pub const MAX_LOAD_CELL_MV: u16 = 3300;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Pins {
    /// HC-SR04 trigger line.
    pub trigger: u8,
    /// HC-SR04 echo line.
    pub echo: u8,
    /// Barrier actuator; high = open.
    pub barrier: u8,
    pub led_stopped: u8,
    pub led_moderate: u8,
    pub led_high: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            trigger: 2,
            echo: 3,
            barrier: 10,
            led_stopped: 11,
            led_moderate: 5,
            led_high: 4,
        }
    }
}

impl Pins {
    fn named(&self) -> [(&'static str, u8); 6] {
        [
            ("trigger", self.trigger),
            ("echo", self.echo),
            ("barrier", self.barrier),
            ("led_stopped", self.led_stopped),
            ("led_moderate", self.led_moderate),
            ("led_high", self.led_high),
        ]
    }
}

/// ADC channel ids of the two load cells.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Channels {
    pub load_cell_1: u8,
    pub load_cell_2: u8,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            load_cell_1: 1,
            load_cell_2: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Serial {
    pub baud_rate: u32,
}

impl Default for Serial {
    fn default() -> Self {
        Self { baud_rate: 9600 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Hardware {
    /// Max time to wait for the echo pulse before a range read fails.
    /// The default covers the 10 m approach gate (58 µs per cm).
    pub sensor_read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 60,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Parameters of the simulated backend used by `weigh_cli run`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Simulation {
    /// Distance at which the simulated vehicle appears.
    pub start_cm: u16,
    /// Distance at which it stops on the platform.
    pub stop_cm: u16,
    pub approach_speed_mps: f32,
    /// Constant level on each load-cell channel.
    pub load_cell_mv: [u16; 2],
    /// Fail every Nth range read (0 = never).
    pub range_fail_every: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            start_cm: 1200,
            stop_cm: 300,
            approach_speed_mps: 10.0,
            load_cell_mv: [1650, 1650],
            range_fail_every: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pins: Pins,
    pub channels: Channels,
    pub serial: Serial,
    pub hardware: Hardware,
    pub logging: Logging,
    pub simulation: Simulation,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let cfg = load_toml(&text).wrap_err_with(|| format!("parsing config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let pins = self.pins.named();
        for (i, (a, pa)) in pins.iter().enumerate() {
            for (b, pb) in &pins[i + 1..] {
                if pa == pb {
                    eyre::bail!("pins.{a} and pins.{b} share GPIO {pa}; pins must be distinct");
                }
            }
        }

        // Channels
        if self.channels.load_cell_1 == self.channels.load_cell_2 {
            eyre::bail!("channels.load_cell_1 and channels.load_cell_2 must be distinct");
        }

        // Serial
        if self.serial.baud_rate == 0 {
            eyre::bail!("serial.baud_rate must be > 0");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly (got {r:?})");
        }

        // Simulation
        let sim = &self.simulation;
        if sim.stop_cm >= sim.start_cm {
            eyre::bail!("simulation.stop_cm must be < simulation.start_cm");
        }
        if !(sim.approach_speed_mps.is_finite() && sim.approach_speed_mps > 0.0) {
            eyre::bail!("simulation.approach_speed_mps must be > 0");
        }
        if sim.load_cell_mv.iter().any(|mv| *mv > MAX_LOAD_CELL_MV) {
            eyre::bail!("simulation.load_cell_mv values must be <= {MAX_LOAD_CELL_MV}");
        }

        Ok(())
    }
}

//! Fixed timing and measurement constants, plus period helpers.
//!
//! These are properties of the installation and are not runtime-configurable.

use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Range sensor polling rate (10 samples per second).
pub const DISTANCE_SAMPLE_HZ: u32 = 10;
/// Advisory LEDs are refreshed at the distance sampling rate.
pub const ADVISORY_REFRESH_HZ: u32 = DISTANCE_SAMPLE_HZ;
/// Load-cell acquisition rate (200 samples per second).
pub const WEIGH_SAMPLE_HZ: u32 = 200;
/// Samples averaged per channel in one weighing cycle.
pub const SAMPLES_PER_CHANNEL: u32 = 50;
/// Speed is only estimated while the vehicle is closer than this.
pub const APPROACH_GATE_CM: u16 = 1000;
/// Above this speed (m/s) the advisory level is High.
pub const HIGH_SPEED_MPS: f32 = 8.0;
/// Load-cell conditioning full scale.
pub const FULL_SCALE_MV: u32 = 3300;
/// Load-cell rated capacity at full scale.
pub const FULL_SCALE_KG: u32 = 20_000;

/// Compute the period in microseconds for a given rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

#[inline]
pub fn period(hz: u32) -> Duration {
    Duration::from_micros(period_us(hz))
}

/// 100 ms.
#[inline]
pub fn distance_period() -> Duration {
    period(DISTANCE_SAMPLE_HZ)
}

/// 5 ms.
#[inline]
pub fn weigh_period() -> Duration {
    period(WEIGH_SAMPLE_HZ)
}

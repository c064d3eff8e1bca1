use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `level` until it reads `want`, or fail with `EchoTimeout` once
/// `timeout` has passed. Returns the time spent waiting.
///
/// With a zero `poll_interval` the loop spins instead of sleeping, which is
/// what pulse-width measurement needs.
pub fn wait_for_level(
    mut level: impl FnMut() -> bool,
    want: bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    let start = Instant::now();
    let deadline = start + timeout;
    while level() != want {
        if Instant::now() >= deadline {
            return Err(HwError::EchoTimeout);
        }
        if poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(poll_interval);
        }
    }
    Ok(start.elapsed())
}

/// HC-SR04 echo pulse width to distance: sound travels out and back, so
/// 1 cm of range is about 58 µs of pulse.
pub fn echo_to_cm(pulse: Duration) -> u16 {
    let cm = pulse.as_micros() / 58;
    cm.min(u128::from(u16::MAX)) as u16
}

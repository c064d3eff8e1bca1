//! Operator-controlled system flags.
//!
//! All flags live in one atomic byte so readers always see a consistent
//! snapshot. `CommandChannel` is the only writer.

use std::sync::atomic::{AtomicU8, Ordering};

const ARMED: u8 = 1 << 0;
const BARRIER_OPEN: u8 = 1 << 1;
const OFF: u8 = 1 << 2;

/// Point-in-time copy of the system flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub armed: bool,
    pub barrier_open: bool,
    /// Toggled by the close command; kept for protocol compatibility, gates nothing.
    pub off: bool,
}

impl StateSnapshot {
    fn to_bits(self) -> u8 {
        let mut b = 0;
        if self.armed {
            b |= ARMED;
        }
        if self.barrier_open {
            b |= BARRIER_OPEN;
        }
        if self.off {
            b |= OFF;
        }
        b
    }

    fn from_bits(b: u8) -> Self {
        Self {
            armed: b & ARMED != 0,
            barrier_open: b & BARRIER_OPEN != 0,
            off: b & OFF != 0,
        }
    }
}

/// Shared system flags; starts disarmed with the barrier closed.
#[derive(Debug, Default)]
pub struct SystemState {
    bits: AtomicU8,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-word read of every flag.
    #[inline]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::from_bits(self.bits.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.snapshot().armed
    }

    /// Atomically replace the flags with `f(current)` and return the new snapshot.
    pub(crate) fn update(&self, f: impl Fn(StateSnapshot) -> StateSnapshot) -> StateSnapshot {
        let mut cur = self.bits.load(Ordering::Acquire);
        loop {
            let next = f(StateSnapshot::from_bits(cur)).to_bits();
            match self
                .bits
                .compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return StateSnapshot::from_bits(next),
                Err(actual) => cur = actual,
            }
        }
    }
}

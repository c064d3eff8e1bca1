//! Single-slot publication of the latest distance sample and speed estimate.
//!
//! Each slot has exactly one writer (the distance sampler) and any number of
//! readers. Values are packed into one atomic word so a read never observes a
//! half-written sample.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// One range reading, timestamped in milliseconds since station start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceSample {
    pub timestamp_ms: u64,
    pub distance_cm: u16,
}

const VALID: u64 = 1 << 63;
const TS_MASK: u64 = (1 << 47) - 1;

/// Latest published `DistanceSample`; overwritten on every publish.
#[derive(Debug, Default)]
pub struct SampleSlot {
    word: AtomicU64,
}

impl SampleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, s: DistanceSample) {
        let w = VALID | ((s.timestamp_ms & TS_MASK) << 16) | u64::from(s.distance_cm);
        self.word.store(w, Ordering::Release);
    }

    pub fn clear(&self) {
        self.word.store(0, Ordering::Release);
    }

    pub fn latest(&self) -> Option<DistanceSample> {
        let w = self.word.load(Ordering::Acquire);
        if w & VALID == 0 {
            return None;
        }
        Some(DistanceSample {
            timestamp_ms: (w >> 16) & TS_MASK,
            distance_cm: (w & 0xFFFF) as u16,
        })
    }
}

/// Latest speed estimate in m/s; `None` while undefined.
///
/// Stored as `f32` bits with NaN meaning undefined.
#[derive(Debug)]
pub struct SpeedSlot {
    bits: AtomicU32,
}

impl Default for SpeedSlot {
    fn default() -> Self {
        Self {
            bits: AtomicU32::new(f32::NAN.to_bits()),
        }
    }
}

impl SpeedSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, mps: Option<f32>) {
        let v = match mps {
            Some(v) if v.is_finite() => v,
            _ => f32::NAN,
        };
        self.bits.store(v.to_bits(), Ordering::Release);
    }

    pub fn load(&self) -> Option<f32> {
        let v = f32::from_bits(self.bits.load(Ordering::Acquire));
        if v.is_nan() { None } else { Some(v) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_reads_none() {
        assert_eq!(SampleSlot::new().latest(), None);
        assert_eq!(SpeedSlot::new().load(), None);
    }

    #[test]
    fn publish_overwrites() {
        let slot = SampleSlot::new();
        slot.publish(DistanceSample {
            timestamp_ms: 100,
            distance_cm: 950,
        });
        slot.publish(DistanceSample {
            timestamp_ms: 200,
            distance_cm: 0xFFFF,
        });
        assert_eq!(
            slot.latest(),
            Some(DistanceSample {
                timestamp_ms: 200,
                distance_cm: 0xFFFF
            })
        );
    }

    #[test]
    fn speed_keeps_sign_and_clears() {
        let slot = SpeedSlot::new();
        slot.publish(Some(-2.5));
        assert_eq!(slot.load(), Some(-2.5));
        slot.publish(None);
        assert_eq!(slot.load(), None);
        slot.publish(Some(f32::INFINITY));
        assert_eq!(slot.load(), None);
    }
}

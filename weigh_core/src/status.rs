//! Per-tick outcomes and station snapshots.

use crate::advisory::AdvisoryLevel;
use crate::weighing::{WeighPhase, WeighResult};

/// Outcome of one weighing tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeighEvent {
    /// Nothing to do (disarmed, vehicle moving, or waiting for it to leave).
    Idle,
    /// Vehicle detected stopped; accumulators reset and first sample taken.
    Started,
    /// Acquisition in progress; per-channel sample counts.
    Sampling { channel_1: u32, channel_2: u32 },
    /// Both channels full; the result must be handed to the reporting channel.
    Completed(WeighResult),
    /// Disarmed mid-cycle; no result will be produced.
    Aborted,
}

/// Point-in-time view of the whole station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationStatus {
    pub armed: bool,
    pub barrier_open: bool,
    pub distance_cm: Option<u16>,
    pub speed_mps: Option<f32>,
    pub advisory: Option<AdvisoryLevel>,
    pub phase: WeighPhase,
    pub cycles_completed: u64,
    pub cycles_aborted: u64,
}

//! State shared between the station's tasks.
//!
//! Every field has a single writing task; see the comments on each field.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use crate::advisory::AdvisoryLevel;
use crate::sample::{SampleSlot, SpeedSlot};
use crate::state::SystemState;
use crate::weighing::WeighPhase;

#[derive(Debug, Default)]
pub struct Shared {
    /// Written by the command channel.
    pub state: SystemState,
    /// Written by the distance sampler.
    pub sample: SampleSlot,
    /// Written by the distance sampler.
    pub speed: SpeedSlot,
    /// Written by the advisory task; 0 = all indicators off.
    advisory: AtomicU8,
    /// Written by the weighing task.
    phase: AtomicU8,
    /// Written by the weighing task.
    cycles_completed: AtomicU64,
    /// Written by the weighing task.
    cycles_aborted: AtomicU64,
    /// Written by the station handle.
    shutdown: AtomicBool,
}

impl Shared {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advisory(&self) -> Option<AdvisoryLevel> {
        AdvisoryLevel::from_code(self.advisory.load(Ordering::Acquire))
    }

    pub(crate) fn set_advisory(&self, level: Option<AdvisoryLevel>) {
        self.advisory
            .store(level.map_or(0, AdvisoryLevel::code), Ordering::Release);
    }

    pub fn phase(&self) -> WeighPhase {
        WeighPhase::from_code(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: WeighPhase) {
        self.phase.store(phase.code(), Ordering::Release);
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn cycles_aborted(&self) -> u64 {
        self.cycles_aborted.load(Ordering::Relaxed)
    }

    pub(crate) fn count_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_aborted(&self) {
        self.cycles_aborted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub(crate) fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

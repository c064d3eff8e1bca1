//! Fixed-rate tick source for the weighing task.
//!
//! A dedicated thread sleeps to absolute deadlines (so lateness never
//! accumulates) and posts a wake notification into a bounded(1) channel
//! without blocking. If the consumer has not taken the previous tick the
//! new one is coalesced and counted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;
use weigh_traits::clock::Clock;

use crate::error::InitError;

#[derive(Debug, Default)]
pub struct TickStats {
    delivered: AtomicU64,
    coalesced: AtomicU64,
    max_late_us: AtomicU64,
}

/// Copy of the tick counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStatsSnapshot {
    pub delivered: u64,
    pub coalesced: u64,
    pub max_late_us: u64,
}

impl TickStats {
    pub fn snapshot(&self) -> TickStatsSnapshot {
        TickStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            max_late_us: self.max_late_us.load(Ordering::Relaxed),
        }
    }

    fn record_late(&self, late: Duration) {
        let us = late.as_micros().min(u128::from(u64::MAX)) as u64;
        self.max_late_us.fetch_max(us, Ordering::Relaxed);
    }
}

pub struct TickSource {
    stats: Arc<TickStats>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Start ticking every `period`. Returns the source and the receiving end
    /// the consumer blocks on; the channel disconnects when the source stops.
    pub fn spawn<C>(period: Duration, clock: C) -> Result<(Self, xch::Receiver<()>), InitError>
    where
        C: Clock + Send + 'static,
    {
        if period.is_zero() {
            return Err(InitError::InvalidConfig("tick period must be non-zero"));
        }
        let (tx, rx) = xch::bounded(1);
        let stats = Arc::new(TickStats::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats_t = stats.clone();
        let shutdown_t = shutdown.clone();

        let join_handle = std::thread::Builder::new()
            .name("weigh-tick".into())
            .spawn(move || {
                let mut next = clock.now() + period;
                loop {
                    clock.sleep_until(next);
                    if shutdown_t.load(Ordering::Relaxed) {
                        break;
                    }
                    stats_t.record_late(clock.now().saturating_duration_since(next));
                    match tx.try_send(()) {
                        Ok(()) => {
                            stats_t.delivered.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(xch::TrySendError::Full(())) => {
                            let n = stats_t.coalesced.fetch_add(1, Ordering::Relaxed) + 1;
                            // One line per power of two keeps a stalled consumer from flooding logs.
                            if n.is_power_of_two() {
                                tracing::warn!(coalesced = n, "weighing task behind; tick coalesced");
                            }
                        }
                        Err(xch::TrySendError::Disconnected(())) => {
                            tracing::debug!("tick consumer gone");
                            break;
                        }
                    }
                    next += period;
                }
                tracing::trace!("tick source exiting");
            })
            .map_err(|e| InitError::Spawn(e.to_string()))?;

        Ok((
            Self {
                stats,
                shutdown,
                join_handle: Some(join_handle),
            },
            rx,
        ))
    }

    pub fn stats(&self) -> Arc<TickStats> {
        self.stats.clone()
    }

    /// Stop ticking and join the thread. Idempotent.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(h) = self.join_handle.take() {
            if let Err(e) = h.join() {
                tracing::warn!(?e, "tick thread panicked during shutdown");
            }
        }
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.stop();
    }
}

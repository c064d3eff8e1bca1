//! Operator commands from the serial link.
//!
//! `'O'` toggles the armed flag and opens the barrier; `'C'` toggles the
//! off flag and closes it. Any other byte is ignored. Matching is
//! case-sensitive.
//!
//! The channel runs inside the serial driver's byte callback
//! (`CommandChannel::into_sink`), one byte per call.

use std::sync::Arc;

use weigh_traits::{ByteSink, DigitalOutput};

use crate::error::StationError;
use crate::shared::Shared;
use crate::state::StateSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
}

impl Command {
    pub fn parse(byte: u8) -> Option<Self> {
        match byte {
            b'O' => Some(Self::Open),
            b'C' => Some(Self::Close),
            _ => None,
        }
    }

    fn apply(self, s: StateSnapshot) -> StateSnapshot {
        match self {
            Self::Open => StateSnapshot {
                armed: !s.armed,
                barrier_open: true,
                ..s
            },
            Self::Close => StateSnapshot {
                off: !s.off,
                barrier_open: false,
                ..s
            },
        }
    }
}

/// Sole writer of the system flags; owns the barrier output.
pub struct CommandChannel<O> {
    barrier: O,
    shared: Arc<Shared>,
}

impl<O: DigitalOutput> CommandChannel<O> {
    pub fn new(barrier: O, shared: Arc<Shared>) -> Self {
        Self { barrier, shared }
    }

    /// Handle one received byte. Returns the new flags if the byte was a command.
    ///
    /// The flags are updated even if driving the barrier fails; the error is
    /// returned so the caller can log it.
    pub fn on_byte(&mut self, byte: u8) -> Result<Option<StateSnapshot>, StationError> {
        let Some(cmd) = Command::parse(byte) else {
            tracing::trace!(byte, "ignoring non-command byte");
            return Ok(None);
        };
        let prev = self.shared.state.snapshot();
        let next = self.shared.state.update(|s| cmd.apply(s));

        let drive = if next.barrier_open {
            self.barrier.set_high()
        } else {
            self.barrier.set_low()
        };

        if prev.armed != next.armed {
            tracing::info!(armed = next.armed, "station {}", if next.armed { "armed" } else { "disarmed" });
        }
        tracing::info!(
            command = ?cmd,
            barrier_open = next.barrier_open,
            off = next.off,
            "operator command"
        );

        drive.map_err(|e| StationError::Output(format!("barrier: {e}")))?;
        Ok(Some(next))
    }
}

impl<O: DigitalOutput + Send + 'static> CommandChannel<O> {
    /// Turn the channel into the serial driver's byte callback. Bytes that
    /// arrive after shutdown are dropped.
    pub fn into_sink(mut self) -> ByteSink {
        Box::new(move |byte| {
            if self.shared.is_shutdown() {
                return;
            }
            if let Err(e) = self.on_byte(byte) {
                tracing::warn!(error = %e, "command applied but output drive failed");
            }
        })
    }
}

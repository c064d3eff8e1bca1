//! Test and helper doubles for the driver traits.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use weigh_traits::{
    AnalogInput, ByteSink, DigitalOutput, HwResult, RangeSensor, SerialRx, SerialTx,
};

fn io_err(msg: &str) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::other(msg.to_string()))
}

/// A range sensor that always errors; useful when only the weighing path matters.
pub struct NoopRangeSensor;

impl RangeSensor for NoopRangeSensor {
    fn read_distance_cm(&mut self) -> HwResult<u16> {
        Err(io_err("noop range sensor"))
    }
}

/// Replays a fixed list of readings, then repeats the last successful one.
/// `None` entries produce a read error.
pub struct ScriptedRange {
    script: VecDeque<Option<u16>>,
    last: Option<u16>,
    reads: Arc<Mutex<u32>>,
}

impl ScriptedRange {
    pub fn new(script: impl IntoIterator<Item = Option<u16>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
            reads: Arc::new(Mutex::new(0)),
        }
    }

    /// Shared counter of read attempts.
    pub fn read_counter(&self) -> Arc<Mutex<u32>> {
        self.reads.clone()
    }
}

impl RangeSensor for ScriptedRange {
    fn read_distance_cm(&mut self) -> HwResult<u16> {
        if let Ok(mut n) = self.reads.lock() {
            *n += 1;
        }
        match self.script.pop_front() {
            Some(Some(cm)) => {
                self.last = Some(cm);
                Ok(cm)
            }
            Some(None) => Err(io_err("echo timeout")),
            None => self.last.ok_or_else(|| io_err("script exhausted")),
        }
    }
}

/// Analog input returning a constant millivolt level per channel.
/// Channels listed in `failing` error on every read.
#[derive(Clone, Default)]
pub struct FixedAnalog {
    levels: HashMap<u8, u16>,
    failing: Arc<Mutex<Vec<u8>>>,
}

impl FixedAnalog {
    pub fn new(levels: impl IntoIterator<Item = (u8, u16)>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
            failing: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make `channel` fail (or recover) from now on.
    pub fn set_failing(&self, channel: u8, failing: bool) {
        if let Ok(mut f) = self.failing.lock() {
            f.retain(|c| *c != channel);
            if failing {
                f.push(channel);
            }
        }
    }
}

impl AnalogInput for FixedAnalog {
    fn read_channel(&mut self, channel: u8) -> HwResult<u16> {
        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(&channel))
            .unwrap_or(false);
        if failing {
            return Err(io_err("adc timeout"));
        }
        self.levels
            .get(&channel)
            .copied()
            .ok_or_else(|| io_err("no such channel"))
    }
}

pub type OutputLog = Arc<Mutex<Vec<(&'static str, bool)>>>;

/// Output line that records every level change into a shared log.
#[derive(Clone)]
pub struct RecordingOutput {
    name: &'static str,
    log: OutputLog,
    level: Arc<AtomicBool>,
}

impl RecordingOutput {
    pub fn shared_log() -> OutputLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn new(name: &'static str) -> Self {
        Self::named(name, &Self::shared_log())
    }

    pub fn named(name: &'static str, log: &OutputLog) -> Self {
        Self {
            name,
            log: log.clone(),
            level: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    pub fn events(log: &OutputLog) -> Vec<(&'static str, bool)> {
        log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn record(&self, high: bool) {
        self.level.store(high, Ordering::Release);
        if let Ok(mut g) = self.log.lock() {
            g.push((self.name, high));
        }
    }
}

impl DigitalOutput for RecordingOutput {
    fn set_high(&mut self) -> HwResult<()> {
        self.record(true);
        Ok(())
    }
    fn set_low(&mut self) -> HwResult<()> {
        self.record(false);
        Ok(())
    }
}

/// In-memory serial link. Injected bytes reach the attached sink on the
/// injecting thread, like a receive interrupt; written lines are captured.
pub struct ChannelSerial;

type SinkSlot = Arc<Mutex<Option<ByteSink>>>;

impl ChannelSerial {
    /// Returns (tx half, rx half, byte injector, captured output).
    pub fn pair() -> (
        CapturedTx,
        InjectedRx,
        ByteInjector,
        Arc<Mutex<Vec<String>>>,
    ) {
        let slot: SinkSlot = Arc::new(Mutex::new(None));
        let lines = Arc::new(Mutex::new(Vec::new()));
        (
            CapturedTx {
                lines: lines.clone(),
            },
            InjectedRx { slot: slot.clone() },
            ByteInjector { slot },
            lines,
        )
    }
}

/// Test side of `ChannelSerial`.
#[derive(Clone)]
pub struct ByteInjector {
    slot: SinkSlot,
}

impl ByteInjector {
    /// Hand one byte to the attached sink. False when nothing is attached.
    pub fn send(&self, byte: u8) -> bool {
        let Ok(mut slot) = self.slot.lock() else {
            return false;
        };
        match slot.as_mut() {
            Some(sink) => {
                sink(byte);
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.slot.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

pub struct CapturedTx {
    lines: Arc<Mutex<Vec<String>>>,
}

impl SerialTx for CapturedTx {
    fn send_line(&mut self, text: &str) -> HwResult<()> {
        if let Ok(mut g) = self.lines.lock() {
            g.push(text.to_string());
        }
        Ok(())
    }
}

pub struct InjectedRx {
    slot: SinkSlot,
}

impl SerialRx for InjectedRx {
    fn attach(&mut self, sink: ByteSink) -> HwResult<()> {
        let mut slot = self.slot.lock().map_err(|_| io_err("sink slot poisoned"))?;
        if slot.is_some() {
            return Err(io_err("sink already attached"));
        }
        *slot = Some(sink);
        Ok(())
    }
}

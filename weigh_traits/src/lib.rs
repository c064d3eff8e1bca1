//! Hardware seams for the weigh station.
//!
//! Drivers live outside the engine; the engine only sees these traits. Every
//! fallible call returns a boxed error so drivers keep their own error types.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type crossing the driver boundary.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Ultrasonic range finder facing the approach lane.
pub trait RangeSensor {
    fn read_distance_cm(&mut self) -> HwResult<u16>;
}

/// Analog front end for the load cells. Readings are in millivolts.
pub trait AnalogInput {
    fn read_channel(&mut self, channel: u8) -> HwResult<u16>;
}

/// A single GPIO output line (LED or barrier actuator).
pub trait DigitalOutput {
    fn set_high(&mut self) -> HwResult<()>;
    fn set_low(&mut self) -> HwResult<()>;

    fn set_level(&mut self, high: bool) -> HwResult<()> {
        if high { self.set_high() } else { self.set_low() }
    }
}

/// Transmit half of the operator serial link.
///
/// `text` is written verbatim; callers supply any line terminator.
pub trait SerialTx {
    fn send_line(&mut self, text: &str) -> HwResult<()>;
}

/// Callback the serial driver invokes once per received byte.
pub type ByteSink = Box<dyn FnMut(u8) + Send>;

/// Receive half of the operator serial link.
///
/// The driver pushes each byte into the attached sink as it arrives, in
/// order, from its own context. Nothing is queued beyond the byte in flight.
pub trait SerialRx {
    /// Install `sink` and start delivery. A second attach is an error.
    fn attach(&mut self, sink: ByteSink) -> HwResult<()>;
}

impl<T: RangeSensor + ?Sized> RangeSensor for Box<T> {
    fn read_distance_cm(&mut self) -> HwResult<u16> {
        (**self).read_distance_cm()
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_channel(&mut self, channel: u8) -> HwResult<u16> {
        (**self).read_channel(channel)
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Box<T> {
    fn set_high(&mut self) -> HwResult<()> {
        (**self).set_high()
    }
    fn set_low(&mut self) -> HwResult<()> {
        (**self).set_low()
    }
}

impl<T: SerialTx + ?Sized> SerialTx for Box<T> {
    fn send_line(&mut self, text: &str) -> HwResult<()> {
        (**self).send_line(text)
    }
}

impl<T: SerialRx + ?Sized> SerialRx for Box<T> {
    fn attach(&mut self, sink: ByteSink) -> HwResult<()> {
        (**self).attach(sink)
    }
}

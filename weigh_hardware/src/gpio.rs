//! Raspberry Pi GPIO backends via `rppal`.

use std::thread::sleep;
use std::time::Duration;

use rppal::gpio::{InputPin, OutputPin};
use weigh_traits::{DigitalOutput, HwResult, RangeSensor};

use crate::error::{HwError, Result};
use crate::util::{echo_to_cm, wait_for_level};

pub use rppal::gpio::Gpio;

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Open the GPIO peripheral.
pub fn open() -> Result<Gpio> {
    Gpio::new().map_err(gpio_err)
}

/// Push-pull output line (barrier actuator or indicator LED).
pub struct GpioOutput {
    pin: OutputPin,
}

impl GpioOutput {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        let mut pin = gpio.get(pin).map_err(gpio_err)?.into_output();
        pin.set_low();
        Ok(Self { pin })
    }
}

impl DigitalOutput for GpioOutput {
    fn set_high(&mut self) -> HwResult<()> {
        self.pin.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> HwResult<()> {
        self.pin.set_low();
        Ok(())
    }
}

/// HC-SR04 ultrasonic ranger: 10 µs trigger pulse, distance from echo width.
pub struct HcSr04 {
    trigger: OutputPin,
    echo: InputPin,
    timeout: Duration,
}

impl HcSr04 {
    pub fn new(gpio: &Gpio, trigger_pin: u8, echo_pin: u8, timeout: Duration) -> Result<Self> {
        let mut trigger = gpio.get(trigger_pin).map_err(gpio_err)?.into_output();
        trigger.set_low();
        let echo = gpio.get(echo_pin).map_err(gpio_err)?.into_input();
        Ok(Self {
            trigger,
            echo,
            timeout,
        })
    }

    fn measure(&mut self) -> Result<u16> {
        self.trigger.set_high();
        sleep(Duration::from_micros(10));
        self.trigger.set_low();

        let echo = &self.echo;
        wait_for_level(|| echo.is_high(), true, self.timeout, Duration::ZERO)?;
        let width = wait_for_level(|| echo.is_high(), false, self.timeout, Duration::ZERO)?;
        Ok(echo_to_cm(width))
    }
}

impl RangeSensor for HcSr04 {
    fn read_distance_cm(&mut self) -> HwResult<u16> {
        match self.measure() {
            Ok(cm) => {
                tracing::trace!(distance_cm = cm, "hc-sr04 sample");
                Ok(cm)
            }
            Err(e) => Err(e.into()),
        }
    }
}

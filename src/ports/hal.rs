//! Board HAL port - abstraction over the GPIO/PWM/ADC lines of a board
//!
//! The sensing services only ever talk to hardware through this trait, so
//! the same pipeline runs on the firmware (Arduino-style pin API, embassy
//! peripherals) and against `SimulatedBoard` on the host.

/// Hardware I/O line identifier
///
/// Opaque to the sensing code; the adapter decides what a number means
/// (MCU pin, ADC mux input, PWM slice).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(pub u8);

impl Channel {
    /// Create a channel from a raw line number
    pub const fn new(line: u8) -> Self {
        Self(line)
    }

    /// Get the raw line number
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Port for driving and sampling board hardware
///
/// All operations are blocking and infallible. A sample sequence, once
/// started, always runs to completion; the caller owns scheduling.
///
/// Holding `&mut` to the port for the duration of a full square scan is what
/// keeps the shared excitation lines (color bus, IR emitter) from being
/// driven by two scans at once.
///
/// # Example Implementation
///
/// ```ignore
/// struct PicoBoard<'d> {
///     outputs: [Output<'d>; 16],
///     pwm: [Pwm<'d>; 3],
///     adc: Adc<'d, Blocking>,
///     inputs: [AdcChannel<'d>; 8],
/// }
///
/// impl BoardHal for PicoBoard<'_> {
///     fn set_digital_output(&mut self, channel: Channel, high: bool) {
///         self.outputs[channel.0 as usize].set_level(high.into());
///     }
///
///     fn read_analog_input(&mut self, channel: Channel) -> u16 {
///         self.adc.blocking_read(&mut self.inputs[channel.0 as usize]).unwrap_or(0)
///     }
///     // ...
/// }
/// ```
pub trait BoardHal {
    /// Drive a digital output line high or low
    fn set_digital_output(&mut self, channel: Channel, high: bool);

    /// Set a PWM/analog output level (0-255)
    fn set_analog_output(&mut self, channel: Channel, level: u8);

    /// Read an analog input in raw ADC units (platform-defined resolution)
    fn read_analog_input(&mut self, channel: Channel) -> u16;

    /// Busy-wait for `us` microseconds
    fn sleep_us(&mut self, us: u32);
}

impl<H: BoardHal + ?Sized> BoardHal for &mut H {
    fn set_digital_output(&mut self, channel: Channel, high: bool) {
        (**self).set_digital_output(channel, high)
    }

    fn set_analog_output(&mut self, channel: Channel, level: u8) {
        (**self).set_analog_output(channel, level)
    }

    fn read_analog_input(&mut self, channel: Channel) -> u16 {
        (**self).read_analog_input(channel)
    }

    fn sleep_us(&mut self, us: u32) {
        (**self).sleep_us(us)
    }
}

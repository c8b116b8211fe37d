//! Signature reader - full R, G, B, IR scan of one square

use crate::config::{ColorBus, SamplerTiming, SquareWiring};
use crate::domain::signature::{OpticalChannel, Signature, SIGNATURE_CHANNELS};
use crate::ports::BoardHal;
use crate::sensing::sampler::DifferentialSampler;

/// Drives the shared excitation bus to scan one square at a time
///
/// Reads red, green, blue, then infrared. Each color sample lights the
/// target color and keeps the other two dark, with the square's LED enable
/// gating the RGB LED. The IR sample toggles the shared emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignatureReader {
    bus: ColorBus,
    color: DifferentialSampler,
    infrared: DifferentialSampler,
}

impl SignatureReader {
    pub const fn new(bus: ColorBus, color_timing: SamplerTiming, ir_timing: SamplerTiming) -> Self {
        Self {
            bus,
            color: DifferentialSampler::new(color_timing),
            infrared: DifferentialSampler::new(ir_timing),
        }
    }

    pub const fn bus(&self) -> &ColorBus {
        &self.bus
    }

    /// Settle time a full scan spends waiting (µs)
    pub const fn scan_duration_us(&self) -> u32 {
        3 * self.color.timing().total_us() + self.infrared.timing().total_us()
    }

    /// Scan one square
    ///
    /// Takes the HAL exclusively for the whole scan: the bus is shared, and
    /// an "on" phase of another square landing inside this scan would
    /// corrupt both ambient estimates.
    pub fn read_signature<H: BoardHal>(&self, hal: &mut H, wiring: &SquareWiring) -> Signature {
        let mut channels = [0u16; SIGNATURE_CHANNELS];
        for channel in OpticalChannel::SCAN_ORDER {
            channels[channel.index()] = self.read_channel(hal, wiring, channel);
        }
        let signature = Signature::from_array(channels);
        debug!(
            "{}: signature r={} g={} b={} ir={}",
            wiring.photodiode,
            signature.red(),
            signature.green(),
            signature.blue(),
            signature.infrared()
        );
        signature
    }

    /// One differential read of one optical channel
    pub fn read_channel<H: BoardHal>(
        &self,
        hal: &mut H,
        wiring: &SquareWiring,
        channel: OpticalChannel,
    ) -> u16 {
        let bus = self.bus;
        let enable = wiring.led_enable;
        match channel {
            OpticalChannel::Infrared => {
                self.infrared
                    .sample(hal, wiring.photodiode, |h, on| h.set_digital_output(bus.ir_emitter, on))
            }
            color => self.color.sample(hal, wiring.photodiode, |h, on| {
                h.set_digital_output(enable, on);
                let level = |c: OpticalChannel| {
                    if on && c == color {
                        bus.drive.lit()
                    } else {
                        bus.drive.dark()
                    }
                };
                h.set_analog_output(bus.red, level(OpticalChannel::Red));
                h.set_analog_output(bus.green, level(OpticalChannel::Green));
                h.set_analog_output(bus.blue, level(OpticalChannel::Blue));
            }),
        }
    }

    /// Raw photodiode read with this square's excitation off
    ///
    /// The cheap input of the ambient change gate: one ADC conversion, no
    /// settle delay.
    pub fn read_ambient<H: BoardHal>(&self, hal: &mut H, wiring: &SquareWiring) -> u16 {
        hal.set_digital_output(wiring.led_enable, false);
        hal.read_analog_input(wiring.photodiode)
    }
}

impl Default for SignatureReader {
    fn default() -> Self {
        Self::new(ColorBus::PCB_V1, SamplerTiming::COLOR_STROBE, SamplerTiming::INFRARED)
    }
}

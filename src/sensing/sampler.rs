//! Differential (ambient-cancelling) sampling
//!
//! Every optical read is taken three times: excitation off, on, off again.
//! Room light shows up in all three, the excitation only in the middle one.
//! Averaging the two dark reads also cancels ambient that drifts linearly
//! across the sample (mains flicker, clouds).

use crate::config::SamplerTiming;
use crate::ports::{BoardHal, Channel};

/// Ambient-cancelled intensity from three raw reads
///
/// `max(0, on - (off1 + off2) / 2)`, truncated toward zero. Noise can make
/// `on` read below the ambient estimate; that is floored at 0.
#[inline]
pub const fn cancel_ambient(off1: u16, on: u16, off2: u16) -> u16 {
    // work in doubled units to keep the half-count of the mean exact
    let doubled = 2 * on as i32 - (off1 as i32 + off2 as i32);
    if doubled <= 0 {
        0
    } else {
        (doubled / 2) as u16
    }
}

/// Three-phase sampler over one analog input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DifferentialSampler {
    timing: SamplerTiming,
}

impl DifferentialSampler {
    pub const fn new(timing: SamplerTiming) -> Self {
        Self { timing }
    }

    pub const fn timing(&self) -> SamplerTiming {
        self.timing
    }

    /// Sample `target` with `excite` switching the excitation source
    ///
    /// `excite(hal, true)` must light the source at the requested drive,
    /// `excite(hal, false)` must put it out. The source is left off.
    pub fn sample<H, F>(&self, hal: &mut H, target: Channel, mut excite: F) -> u16
    where
        H: BoardHal,
        F: FnMut(&mut H, bool),
    {
        excite(hal, false);
        hal.sleep_us(self.timing.off_settle_us);
        let off1 = hal.read_analog_input(target);

        excite(hal, true);
        hal.sleep_us(self.timing.on_settle_us);
        let on = hal.read_analog_input(target);

        excite(hal, false);
        hal.sleep_us(self.timing.off_settle_us);
        let off2 = hal.read_analog_input(target);

        let signal = cancel_ambient(off1, on, off2);
        trace!("{}: off1={} on={} off2={} -> {}", target, off1, on, off2, signal);
        signal
    }
}

impl Default for DifferentialSampler {
    fn default() -> Self {
        Self::new(SamplerTiming::COLOR_STROBE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{HalCall, SimulatedBoard};

    #[test]
    fn test_zero_floor() {
        assert_eq!(cancel_ambient(100, 20, 100), 0);
        assert_eq!(cancel_ambient(0, 0, 1023), 0);
        assert_eq!(cancel_ambient(u16::MAX, 0, u16::MAX), 0);
        for off in [0u16, 5, 500, 1023] {
            for on in [0u16, 3, 700, 1023] {
                // u16 can't go negative; the point is it didn't wrap
                assert!(cancel_ambient(off, on, off) <= on);
            }
        }
    }

    #[test]
    fn test_ambient_symmetry() {
        for v in [0u16, 1, 512, 1023, u16::MAX] {
            assert_eq!(cancel_ambient(v, v, v), 0);
        }
    }

    #[test]
    fn test_mean_of_dark_reads() {
        // ambient 3.5, signal 6.5 truncates to 6
        assert_eq!(cancel_ambient(3, 10, 4), 6);
        assert_eq!(cancel_ambient(100, 300, 120), 190);
        assert_eq!(cancel_ambient(0, u16::MAX, 0), u16::MAX);
    }

    #[test]
    fn test_sequence_and_settle_times() {
        let mut hal = SimulatedBoard::new();
        let emitter = Channel(2);
        let sensor = Channel(14);
        let sampler = DifferentialSampler::new(SamplerTiming::COLOR_STROBE);

        sampler.sample(&mut hal, sensor, |h, on| h.set_digital_output(emitter, on));

        assert_eq!(
            hal.trace(),
            &[
                HalCall::Digital(emitter, false),
                HalCall::Sleep(300),
                HalCall::Read(sensor),
                HalCall::Digital(emitter, true),
                HalCall::Sleep(500),
                HalCall::Read(sensor),
                HalCall::Digital(emitter, false),
                HalCall::Sleep(300),
                HalCall::Read(sensor),
            ]
        );
        assert_eq!(hal.elapsed_us(), 1100);
        assert!(!hal.digital(emitter));
    }
}

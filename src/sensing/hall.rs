//! Hall-effect polarity detector

use crate::domain::polarity::{Polarity, PolarityThresholds};
use crate::ports::{BoardHal, Channel};

/// Single-read magnetic polarity detector for one square
///
/// Magnetic field is unaffected by room light, so there is no differential
/// cancellation: one raw conversion, thresholded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagneticPolarityDetector {
    channel: Channel,
    thresholds: PolarityThresholds,
}

impl MagneticPolarityDetector {
    pub const fn new(channel: Channel, thresholds: PolarityThresholds) -> Self {
        Self {
            channel,
            thresholds,
        }
    }

    pub const fn thresholds(&self) -> PolarityThresholds {
        self.thresholds
    }

    /// Raw Hall reading (for diagnostics)
    pub fn read_raw<H: BoardHal>(&self, hal: &mut H) -> u16 {
        hal.read_analog_input(self.channel)
    }

    pub fn read_polarity<H: BoardHal>(&self, hal: &mut H) -> Polarity {
        let raw = self.read_raw(hal);
        let polarity = self.thresholds.classify(raw);
        trace!("{}: hall={}", self.channel, raw);
        polarity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{SimPiece, SimulatedBoard};
    use crate::config::{ColorBus, SquareWiring};

    #[test]
    fn test_reads_magnet_of_piece() {
        let wiring = SquareWiring {
            photodiode: Channel(14),
            led_enable: Channel(12),
            hall: Channel(18),
        };
        let mut hal = SimulatedBoard::new();
        hal.add_square(wiring, ColorBus::PCB_V1, 40);
        let detector = MagneticPolarityDetector::new(wiring.hall, PolarityThresholds::PCB_V1);

        assert_eq!(detector.read_polarity(&mut hal), Polarity::None);

        hal.place(wiring.photodiode, SimPiece::new([0; 4], 250));
        assert_eq!(detector.read_polarity(&mut hal), Polarity::NegativePole);

        hal.place(wiring.photodiode, SimPiece::new([0; 4], 600));
        assert_eq!(detector.read_polarity(&mut hal), Polarity::PositivePole);
        assert_eq!(detector.read_raw(&mut hal), 600);
        assert_eq!(hal.elapsed_us(), 0);
    }
}

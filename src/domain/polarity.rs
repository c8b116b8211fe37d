//! Magnetic polarity classification
//!
//! Pieces carry a magnet whose orientation encodes the side. A Hall sensor
//! under the square reads above its quiescent level for one pole and below
//! it for the other. The band between the two thresholds means no magnet.

use crate::error::ConfigError;

/// Tri-state result of a Hall reading
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    #[default]
    None,
    PositivePole,
    NegativePole,
}

/// Side of a piece, inferred from its magnet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PieceSide {
    #[default]
    None,
    White,
    Black,
}

impl From<Polarity> for PieceSide {
    fn from(polarity: Polarity) -> Self {
        match polarity {
            Polarity::None => PieceSide::None,
            Polarity::PositivePole => PieceSide::White,
            Polarity::NegativePole => PieceSide::Black,
        }
    }
}

impl PieceSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            PieceSide::None => "NONE",
            PieceSide::White => "WHITE",
            PieceSide::Black => "BLACK",
        }
    }
}

/// Per-sensor Hall thresholds
///
/// Sensor units vary in quiescent output, so every square carries its own
/// pair. Invariant: `low < high`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PolarityThresholds {
    low: u16,
    high: u16,
}

impl PolarityThresholds {
    /// Thresholds used on the v1 square PCB
    pub const PCB_V1: Self = Self {
        low: 300,
        high: 500,
    };

    pub const fn new(low: u16, high: u16) -> Result<Self, ConfigError> {
        if low >= high {
            return Err(ConfigError::InvalidPolarityThresholds { low, high });
        }
        Ok(Self { low, high })
    }

    pub const fn low(&self) -> u16 {
        self.low
    }

    pub const fn high(&self) -> u16 {
        self.high
    }

    /// Classify a raw Hall reading; `[low, high]` is `None`
    #[inline]
    pub const fn classify(&self, raw: u16) -> Polarity {
        if raw > self.high {
            Polarity::PositivePole
        } else if raw < self.low {
            Polarity::NegativePole
        } else {
            Polarity::None
        }
    }
}

impl Default for PolarityThresholds {
    fn default() -> Self {
        Self::PCB_V1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcb_v1_band() {
        let t = PolarityThresholds::new(300, 500).unwrap();
        assert_eq!(t.classify(250), Polarity::NegativePole);
        assert_eq!(t.classify(400), Polarity::None);
        assert_eq!(t.classify(600), Polarity::PositivePole);
    }

    #[test]
    fn test_band_edges_are_none() {
        let t = PolarityThresholds::PCB_V1;
        assert_eq!(t.classify(300), Polarity::None);
        assert_eq!(t.classify(500), Polarity::None);
        assert_eq!(t.classify(299), Polarity::NegativePole);
        assert_eq!(t.classify(501), Polarity::PositivePole);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        assert_eq!(
            PolarityThresholds::new(500, 300),
            Err(ConfigError::InvalidPolarityThresholds { low: 500, high: 300 })
        );
        assert!(PolarityThresholds::new(400, 400).is_err());
    }

    #[test]
    fn test_side_from_polarity() {
        assert_eq!(PieceSide::from(Polarity::PositivePole), PieceSide::White);
        assert_eq!(PieceSide::from(Polarity::NegativePole), PieceSide::Black);
        assert_eq!(PieceSide::from(Polarity::None), PieceSide::None);
    }
}

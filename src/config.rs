//! Board configuration
//!
//! Wiring, settle timing and thresholds for one board, built once at
//! startup and checked with [`BoardConfig::validate`] before the first poll.

use heapless::Vec;

use crate::domain::gate::DEFAULT_GATE_THRESHOLD;
use crate::domain::polarity::PolarityThresholds;
use crate::domain::square::SquareName;
use crate::error::ConfigError;
use crate::ports::Channel;

/// Maximum squares handled by one aggregator
pub const MAX_SQUARES: usize = 64;

/// Settle delays of a differential sample
///
/// The photodiode responds more slowly to a rising drive than to a falling
/// one, so the two delays are tuned separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerTiming {
    /// Wait after switching excitation off (µs)
    pub off_settle_us: u32,
    /// Wait after switching excitation on (µs)
    pub on_settle_us: u32,
}

impl SamplerTiming {
    /// RGB strobe on the v1 square PCB
    pub const COLOR_STROBE: Self = Self {
        off_settle_us: 300,
        on_settle_us: 500,
    };

    /// IR emitter on the v1 square PCB
    pub const INFRARED: Self = Self {
        off_settle_us: 300,
        on_settle_us: 300,
    };

    /// Total settle time of one three-phase sample
    pub const fn total_us(&self) -> u32 {
        2 * self.off_settle_us + self.on_settle_us
    }
}

impl Default for SamplerTiming {
    fn default() -> Self {
        Self::COLOR_STROBE
    }
}

/// PWM polarity of the RGB LED
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorDrive {
    /// Cathodes on PWM: 0 = lit, 255 = dark
    #[default]
    CommonAnode,
    /// Anodes on PWM: 255 = lit, 0 = dark
    CommonCathode,
}

impl ColorDrive {
    pub const fn lit(self) -> u8 {
        match self {
            ColorDrive::CommonAnode => 0,
            ColorDrive::CommonCathode => 255,
        }
    }

    pub const fn dark(self) -> u8 {
        match self {
            ColorDrive::CommonAnode => 255,
            ColorDrive::CommonCathode => 0,
        }
    }
}

/// Excitation lines shared by every square
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorBus {
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
    pub ir_emitter: Channel,
    pub drive: ColorDrive,
}

impl ColorBus {
    /// v1 square PCB (Arduino Uno pins)
    pub const PCB_V1: Self = Self {
        red: Channel(6),
        green: Channel(3),
        blue: Channel(5),
        ir_emitter: Channel(2),
        drive: ColorDrive::CommonAnode,
    };

    pub const fn lines(&self) -> [Channel; 4] {
        [self.red, self.green, self.blue, self.ir_emitter]
    }
}

impl Default for ColorBus {
    fn default() -> Self {
        Self::PCB_V1
    }
}

/// Lines belonging to one square
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SquareWiring {
    /// Photodiode analog input
    pub photodiode: Channel,
    /// Digital enable of this square's RGB LED
    pub led_enable: Channel,
    /// Hall sensor analog input
    pub hall: Channel,
}

impl SquareWiring {
    pub const fn lines(&self) -> [Channel; 3] {
        [self.photodiode, self.led_enable, self.hall]
    }
}

/// One square of the board
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SquareConfig {
    pub name: SquareName,
    pub wiring: SquareWiring,
    pub polarity: PolarityThresholds,
}

/// Complete board description
///
/// Squares are kept in the order they were added; that order is the order
/// of the rendered notation string.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    pub bus: ColorBus,
    pub color_timing: SamplerTiming,
    pub ir_timing: SamplerTiming,
    /// Absolute ambient threshold of the change gate
    pub gate_threshold: u16,
    squares: Vec<SquareConfig, MAX_SQUARES>,
}

impl BoardConfig {
    /// Empty board on the given bus with v1 timing and threshold
    pub const fn new(bus: ColorBus) -> Self {
        Self {
            bus,
            color_timing: SamplerTiming::COLOR_STROBE,
            ir_timing: SamplerTiming::INFRARED,
            gate_threshold: DEFAULT_GATE_THRESHOLD,
            squares: Vec::new(),
        }
    }

    /// Append a square
    pub fn add_square(
        &mut self,
        name: &str,
        wiring: SquareWiring,
        polarity: PolarityThresholds,
    ) -> Result<(), ConfigError> {
        let index = self.squares.len();
        let name = SquareName::new(name).ok_or(ConfigError::InvalidSquareName { index })?;
        self.squares
            .push(SquareConfig {
                name,
                wiring,
                polarity,
            })
            .map_err(|_| ConfigError::TooManySquares { max: MAX_SQUARES })
    }

    pub fn squares(&self) -> &[SquareConfig] {
        &self.squares
    }

    /// Check the board before it is polled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.squares.is_empty() {
            return Err(ConfigError::NoSquares);
        }
        let bus = self.bus.lines();
        for (index, square) in self.squares.iter().enumerate() {
            if self.squares[..index].iter().any(|s| s.name == square.name) {
                return Err(ConfigError::DuplicateSquare { index });
            }
            let lines = square.wiring.lines();
            for (i, line) in lines.iter().enumerate() {
                if bus.contains(line) {
                    return Err(ConfigError::SharedChannelConflict {
                        index,
                        line: line.value(),
                    });
                }
                if lines[..i].contains(line) {
                    return Err(ConfigError::DuplicateSquareLine {
                        index,
                        other: index,
                        line: line.value(),
                    });
                }
                if let Some(other) = self.squares[..index]
                    .iter()
                    .position(|s| s.wiring.lines().contains(line))
                {
                    return Err(ConfigError::DuplicateSquareLine {
                        index,
                        other,
                        line: line.value(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(ColorBus::PCB_V1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiring(base: u8) -> SquareWiring {
        SquareWiring {
            photodiode: Channel(base),
            led_enable: Channel(base + 1),
            hall: Channel(base + 2),
        }
    }

    #[test]
    fn test_valid_board() {
        let mut board = BoardConfig::default();
        board.add_square("a1", wiring(20), PolarityThresholds::PCB_V1).unwrap();
        board.add_square("b1", wiring(30), PolarityThresholds::PCB_V1).unwrap();
        assert_eq!(board.validate(), Ok(()));
        assert_eq!(board.squares()[1].name.as_str(), "b1");
    }

    #[test]
    fn test_empty_board_rejected() {
        assert_eq!(BoardConfig::default().validate(), Err(ConfigError::NoSquares));
    }

    #[test]
    fn test_duplicate_square_rejected() {
        let mut board = BoardConfig::default();
        board.add_square("a1", wiring(20), PolarityThresholds::PCB_V1).unwrap();
        board.add_square("a1", wiring(30), PolarityThresholds::PCB_V1).unwrap();
        assert_eq!(board.validate(), Err(ConfigError::DuplicateSquare { index: 1 }));
    }

    #[test]
    fn test_bus_line_reuse_rejected() {
        let mut board = BoardConfig::default();
        // LED enable lands on line 5, the blue PWM of the v1 bus
        board.add_square("a1", wiring(4), PolarityThresholds::PCB_V1).unwrap();
        assert_eq!(
            board.validate(),
            Err(ConfigError::SharedChannelConflict { index: 0, line: 5 })
        );
    }

    #[test]
    fn test_square_line_reuse_rejected() {
        let mut board = BoardConfig::default();
        board.add_square("a1", wiring(20), PolarityThresholds::PCB_V1).unwrap();
        // photodiode of b1 is the Hall line of a1
        board.add_square("b1", wiring(22), PolarityThresholds::PCB_V1).unwrap();
        assert_eq!(
            board.validate(),
            Err(ConfigError::DuplicateSquareLine {
                index: 1,
                other: 0,
                line: 22
            })
        );

        let mut board = BoardConfig::default();
        let shorted = SquareWiring {
            photodiode: Channel(40),
            led_enable: Channel(41),
            hall: Channel(40),
        };
        board.add_square("a1", shorted, PolarityThresholds::PCB_V1).unwrap();
        assert_eq!(
            board.validate(),
            Err(ConfigError::DuplicateSquareLine {
                index: 0,
                other: 0,
                line: 40
            })
        );
    }

    #[test]
    fn test_bad_square_name() {
        let mut board = BoardConfig::default();
        assert_eq!(
            board.add_square("", wiring(20), PolarityThresholds::PCB_V1),
            Err(ConfigError::InvalidSquareName { index: 0 })
        );
    }

    #[test]
    fn test_drive_levels() {
        assert_eq!(ColorDrive::CommonAnode.lit(), 0);
        assert_eq!(ColorDrive::CommonAnode.dark(), 255);
        assert_eq!(ColorDrive::CommonCathode.lit(), 255);
        assert_eq!(SamplerTiming::COLOR_STROBE.total_us(), 1100);
    }
}

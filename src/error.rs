//! Configuration errors
//!
//! Everything that can go wrong with this crate goes wrong at startup:
//! tables, wiring and thresholds are checked once, before the first poll.
//! Sensing itself has no error path.

/// Startup configuration fault
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("sticker table has no entries")]
    EmptyStickerTable,
    #[error("sticker table is full (max {max} entries)")]
    TableFull { max: usize },
    #[error("sticker entry {index} has {found} reference channels, classifier uses {expected}")]
    ReferenceLengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("reference must have 3 or 4 channels, got {found}")]
    UnsupportedChannelCount { found: usize },
    #[error("weight for channel {channel} must be finite and non-negative")]
    InvalidWeight { channel: usize },
    #[error("label is {len} bytes, max is {max}")]
    LabelTooLong { len: usize, max: usize },
    #[error("label at entry {index} is already in the table")]
    DuplicateLabel { index: usize },
    #[error("polarity thresholds must satisfy low < high (low={low}, high={high})")]
    InvalidPolarityThresholds { low: u16, high: u16 },
    #[error("board has no squares")]
    NoSquares,
    #[error("board has more than {max} squares")]
    TooManySquares { max: usize },
    #[error("square name at index {index} is not a valid square")]
    InvalidSquareName { index: usize },
    #[error("square name at index {index} is used twice")]
    DuplicateSquare { index: usize },
    #[error("square {index} reuses line {line} of the shared excitation bus")]
    SharedChannelConflict { index: usize, line: u8 },
    #[error("square {index} reuses line {line} already wired to square {other}")]
    DuplicateSquareLine { index: usize, other: usize, line: u8 },
    #[error("notation at entry {index} is not an ASCII character")]
    NonAsciiNotation { index: usize },
}

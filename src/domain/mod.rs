//! Domain layer - pure sensing logic independent of hardware
//!
//! Signatures, sticker tables, the nearest-neighbor classifier, Hall
//! polarity thresholds and the ambient change gate. Nothing in here touches
//! a pin.

pub mod calibration;
pub mod gate;
pub mod polarity;
pub mod signature;
pub mod square;
pub mod sticker;

pub use calibration::{Calibration, EMPTY_NOTATION};
pub use gate::{AmbientChangeGate, GateEvent, GateState, DEFAULT_GATE_THRESHOLD};
pub use polarity::{PieceSide, Polarity, PolarityThresholds};
pub use signature::{ChannelPolicy, OpticalChannel, Signature, SIGNATURE_CHANNELS};
pub use square::{SquareContent, SquareName, SquareState};
pub use sticker::{
    ClassifierConfig, Label, NotationMap, StickerClassifier, StickerEntry, StickerMatch,
    StickerTable, EMPTY_LABEL, UNKNOWN_NOTATION, UNRESOLVED_LABEL,
};

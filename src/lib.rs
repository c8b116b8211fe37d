//! Sticker Board Library
//!
//! Reads a board of instrumented squares. Each square has a photodiode lit
//! in turn by red, green, blue and infrared emitters, plus a Hall sensor.
//! A piece's sticker is identified by its reflectance signature, its side by
//! the pole of its magnet, and only squares a piece is covering get the
//! full rescan on each poll.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - Signature, StickerTable, StickerClassifier                    │
//! │  - AmbientChangeGate, PolarityThresholds                         │
//! │  - Calibration presets                                           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Sensing / Board                              │
//! │  - DifferentialSampler, SignatureReader                          │
//! │  - MagneticPolarityDetector                                      │
//! │  - SquareUnit, BoardStateAggregator                              │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - BoardHal: digital/analog outputs, ADC, settle delay           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - SimulatedBoard: in-memory light and magnet model              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Firmware implements `BoardHal` for its own pins and drives
//! [`BoardStateAggregator::poll`] from its main loop. The host side decodes
//! [`BoardReport`] frames (see [`board_protocol`]).

#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod fmt;

// ============================================================================
// Protocol (shared between host and device)
// ============================================================================

pub mod board_protocol;

pub use board_protocol::{
    decode_frame, encode_frame, BoardReport, SquareReport, MAX_FEN_LEN, MAX_FRAME_LEN,
};

// ============================================================================
// Hexagonal Architecture
// ============================================================================

/// Domain layer - pure logic, no I/O
pub mod domain;

/// Ports - traits defining boundaries
pub mod ports;

/// Adapters - concrete implementations
pub mod adapters;

/// Sensing services driven through the HAL port
pub mod sensing;

/// Squares and the board poll loop
pub mod board;

pub mod config;
pub mod error;

pub use adapters::{SimPiece, SimulatedBoard};
pub use board::{BoardStateAggregator, PollSummary, SquareUnit};
pub use config::{BoardConfig, ColorBus, ColorDrive, SamplerTiming, SquareConfig, SquareWiring};
pub use domain::{
    Calibration, ClassifierConfig, Label, PieceSide, Polarity, PolarityThresholds, Signature,
    StickerClassifier, StickerTable,
};
pub use error::ConfigError;
pub use ports::{BoardHal, Channel};

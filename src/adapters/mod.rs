//! Adapters - concrete implementations of ports
//!
//! # Available Adapters
//!
//! - **sim**: in-memory board for tests and the host's simulate mode
//!
//! Firmware brings its own `BoardHal` for the pins of its PCB.

pub mod sim;

pub use sim::{HalCall, SimPiece, SimulatedBoard};

//! Sensing services - domain logic driven through the `BoardHal` port
//!
//! - **sampler**: three-phase ambient-cancelled read of one input
//! - **reader**: R/G/B/IR signature scan over the shared excitation bus
//! - **hall**: magnetic polarity of a square

pub mod hall;
pub mod reader;
pub mod sampler;

pub use hall::MagneticPolarityDetector;
pub use reader::SignatureReader;
pub use sampler::{cancel_ambient, DifferentialSampler};

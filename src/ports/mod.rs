//! Ports (interfaces) defining the boundaries of the application
//!
//! - **BoardHal**: how we drive excitation lines and sample the ADC
//!   (embassy peripherals on the device, `SimulatedBoard` on the host)

pub mod hal;

pub use hal::{BoardHal, Channel};

//! Board layer - squares and the aggregate poll loop
//!
//! - **square_unit**: one square's wiring, gate and cached state
//! - **aggregator**: polls every square and renders the board

pub mod aggregator;
pub mod square_unit;

pub use aggregator::{BoardStateAggregator, PollSummary};
pub use square_unit::SquareUnit;

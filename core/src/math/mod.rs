pub mod extrema;
pub mod units;

pub use extrema::{Bounds, Extrema, ExtremaTracker};

//! Normalization and plot-projection core for flight-state snapshots.
//!
//! A snapshot of positional state vectors is decoded at the `feed` boundary,
//! filtered into flight samples with their extrema by the normalizer, and
//! mapped onto a fixed logical plot area by the projector. Every call is a
//! single synchronous pass with no state kept between snapshots.

pub mod feed;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{PlotConfig, ProcessingStage, StageError, StageOutput};

use serde::{Deserialize, Serialize};

/// Logical plot area and color-ramp settings shared by the projection stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Width of the ground-speed axis in logical units.
    pub plot_width: u32,
    /// Height of the altitude axis in logical units.
    pub plot_height: u32,
    /// Edge length of a marker; positions stay this far from the far edges.
    pub marker_size: u32,
    /// Climb/descent rate (m/s) that maps to a fully saturated color.
    pub vertical_rate_scale: f64,
    /// Markers with a larger absolute vertical rate (m/s) are drawn in front.
    pub emphasis_threshold: f64,
    /// Markers right of this x coordinate anchor their annotation to the right edge.
    pub right_anchor_from: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            plot_width: 1000,
            plot_height: 500,
            marker_size: 5,
            vertical_rate_scale: 10.0,
            emphasis_threshold: 10.0,
            right_anchor_from: 650,
        }
    }
}

impl PlotConfig {
    pub fn validate(&self) -> StageResult<()> {
        if self.plot_width <= self.marker_size || self.plot_height <= self.marker_size {
            return Err(StageError::InvalidConfig(format!(
                "plot area {}x{} must exceed marker size {}",
                self.plot_width, self.plot_height, self.marker_size
            )));
        }
        if !self.vertical_rate_scale.is_finite() || self.vertical_rate_scale <= 0.0 {
            return Err(StageError::InvalidConfig(format!(
                "vertical rate scale must be positive, got {}",
                self.vertical_rate_scale
            )));
        }
        if !self.emphasis_threshold.is_finite() || self.emphasis_threshold < 0.0 {
            return Err(StageError::InvalidConfig(format!(
                "emphasis threshold must be non-negative, got {}",
                self.emphasis_threshold
            )));
        }
        Ok(())
    }

    /// Largest x coordinate a marker may occupy.
    pub fn max_screen_x(&self) -> u32 {
        self.plot_width.saturating_sub(self.marker_size)
    }

    /// Largest y coordinate a marker may occupy.
    pub fn max_screen_y(&self) -> u32 {
        self.plot_height.saturating_sub(self.marker_size)
    }
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub payload: T,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub marker_count: Option<usize>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
///
/// An empty snapshot is not an error; it is reported through the stage payload.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// A single step of the snapshot pipeline.
pub trait ProcessingStage {
    type Input;
    type Output;

    fn initialize(&mut self, config: &PlotConfig) -> StageResult<()>;
    fn execute(&mut self, input: Self::Input) -> StageResult<StageOutput<Self::Output>>;
    fn cleanup(&mut self);
}

use serde::{Deserialize, Serialize};

use crate::math::units::{flight_level, mps_to_knots};
use crate::prelude::{
    PlotConfig, ProcessingStage, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::processing::annotation::{annotate, axis_labels, Annotation, AxisLabels};
use crate::processing::color::{MarkerColor, VerticalTrend};
use crate::processing::normalizer::{FlightSample, SampleSet};
use crate::telemetry::log::LogManager;

/// Edge the renderer should position a marker against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAnchor {
    Left,
    Right,
}

/// Renderer-ready view of one flight sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Distance from the left edge, in `[0, plot_width - marker_size]`.
    pub screen_x: u32,
    /// Distance from the top edge, in `[0, plot_height - marker_size]`.
    pub screen_y: u32,
    pub anchor: HorizontalAnchor,
    /// Distance from the right edge; used when `anchor` is `Right`.
    pub right_offset: u32,
    pub color: MarkerColor,
    pub trend: VerticalTrend,
    pub emphasized: bool,
    /// 1 for level flight, 2 when climbing or descending, 3 when emphasized.
    pub stack_order: u8,
    pub flight_level: i64,
    pub speed_knots: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    pub annotation: Annotation,
}

/// Markers and axis labels of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub plot_width: u32,
    pub plot_height: u32,
    pub marker_size: u32,
    pub markers: Vec<Marker>,
    pub labels: AxisLabels,
}

impl Projection {
    pub fn emphasized_count(&self) -> usize {
        self.markers.iter().filter(|marker| marker.emphasized).count()
    }
}

/// `floor(value * span / max)` clamped to `[0, limit]`. The axis origin is zero.
fn scale_axis(value: f64, span: u32, max: f64, limit: u32) -> u32 {
    let scaled = (value * (f64::from(span) / max)).floor();
    scaled.clamp(0.0, f64::from(limit)) as u32
}

pub fn project_sample(sample: &FlightSample, set: &SampleSet, config: &PlotConfig) -> Marker {
    let extrema = &set.extrema;

    let screen_x = scale_axis(
        sample.ground_speed,
        config.plot_width,
        extrema.ground_speed.max,
        config.max_screen_x(),
    );
    let height_fraction = scale_axis(
        sample.altitude,
        config.plot_height,
        extrema.altitude.max,
        config.plot_height,
    );
    let screen_y = (config.plot_height - height_fraction).min(config.max_screen_y());

    let anchor = if screen_x > config.right_anchor_from {
        HorizontalAnchor::Right
    } else {
        HorizontalAnchor::Left
    };

    let trend = VerticalTrend::from_rate(sample.vertical_rate);
    let emphasized = sample.vertical_rate.abs() > config.emphasis_threshold;
    let stack_order = match (emphasized, trend) {
        (true, _) => 3,
        (false, VerticalTrend::Level) => 1,
        (false, _) => 2,
    };

    Marker {
        screen_x,
        screen_y,
        anchor,
        right_offset: config.plot_width - screen_x,
        color: MarkerColor::from_vertical_rate(sample.vertical_rate, config.vertical_rate_scale),
        trend,
        emphasized,
        stack_order,
        flight_level: flight_level(sample.altitude),
        speed_knots: mps_to_knots(sample.ground_speed),
        callsign: sample.callsign.clone(),
        annotation: annotate(sample),
    }
}

/// Maps every sample of the set onto the plot area described by `config`.
pub fn project(set: &SampleSet, config: &PlotConfig) -> Projection {
    Projection {
        plot_width: config.plot_width,
        plot_height: config.plot_height,
        marker_size: config.marker_size,
        markers: set
            .samples
            .iter()
            .map(|sample| project_sample(sample, set, config))
            .collect(),
        labels: axis_labels(&set.extrema),
    }
}

/// Stage wrapper around [`project`].
pub struct ProjectorStage {
    config: Option<PlotConfig>,
    logger: LogManager,
}

impl ProjectorStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("projector"),
        }
    }
}

impl Default for ProjectorStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for ProjectorStage {
    type Input = SampleSet;
    type Output = Projection;

    fn initialize(&mut self, config: &PlotConfig) -> StageResult<()> {
        config.validate()?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: SampleSet) -> StageResult<StageOutput<Projection>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        if input.samples.is_empty() {
            return Err(StageError::InvalidInput("no samples to project".into()));
        }

        self.logger.record("Drawing flights");
        let projection = project(&input, config);
        let marker_count = projection.markers.len();

        let metadata = StageMetadata {
            marker_count: Some(marker_count),
            notes: vec![
                format!(
                    "{} markers, {} emphasized",
                    marker_count,
                    projection.emphasized_count()
                ),
                projection.labels.altitude.clone(),
                projection.labels.speed.clone(),
            ],
            ..Default::default()
        };
        self.logger.detail(&metadata.notes[0]);

        Ok(StageOutput {
            payload: projection,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::extrema::ExtremaTracker;

    fn sample(altitude: f64, ground_speed: f64, vertical_rate: f64) -> FlightSample {
        FlightSample {
            altitude,
            ground_speed,
            vertical_rate,
            callsign: None,
        }
    }

    fn set_of(samples: Vec<FlightSample>) -> SampleSet {
        let mut tracker = ExtremaTracker::new();
        for s in &samples {
            tracker.observe(s.altitude, s.ground_speed, s.vertical_rate);
        }
        SampleSet {
            samples,
            extrema: tracker.finish().unwrap(),
        }
    }

    #[test]
    fn extreme_sample_lands_in_the_top_right_corner() {
        let mut top = sample(10000.0, 250.0, 5.0);
        top.callsign = Some("CALL1".into());
        let set = set_of(vec![top, sample(5000.0, 125.0, 0.0)]);
        let projection = project(&set, &PlotConfig::default());

        let marker = &projection.markers[0];
        assert_eq!(marker.screen_y, 0);
        assert_eq!(marker.screen_x, 995);
        assert_eq!(marker.anchor, HorizontalAnchor::Right);
        assert_eq!(marker.right_offset, 5);
        assert_eq!(marker.callsign.as_deref(), Some("CALL1"));
        assert_eq!(marker.trend, VerticalTrend::Ascending);
        assert_eq!(marker.stack_order, 2);

        let half = &projection.markers[1];
        assert_eq!(half.screen_x, 500);
        assert_eq!(half.screen_y, 250);
        assert_eq!(half.anchor, HorizontalAnchor::Left);
        assert_eq!(half.color, MarkerColor::WHITE);
        assert_eq!(half.stack_order, 1);
    }

    #[test]
    fn origin_is_zero_not_the_sample_minimum() {
        let set = set_of(vec![sample(8000.0, 200.0, 0.0), sample(4000.0, 100.0, 0.0)]);
        let projection = project(&set, &PlotConfig::default());
        let low = &projection.markers[1];
        assert_eq!(low.screen_x, 500);
        assert_eq!(low.screen_y, 250);
    }

    #[test]
    fn floored_sample_clamps_to_the_bottom_margin() {
        let set = set_of(vec![sample(12000.0, 240.0, -2.0), sample(1.0, 1.0, 0.0)]);
        let config = PlotConfig::default();
        let projection = project(&set, &config);
        let marker = &projection.markers[1];
        assert_eq!(marker.screen_y, config.max_screen_y());
        assert_eq!(marker.screen_x, 4);
    }

    #[test]
    fn positions_stay_inside_plot_bounds() {
        let samples = (1..=40)
            .map(|i| sample(f64::from(i) * 300.0, f64::from(i) * 7.0, f64::from(i % 9) - 4.0))
            .collect();
        let set = set_of(samples);
        let config = PlotConfig {
            plot_width: 640,
            plot_height: 320,
            ..Default::default()
        };
        for marker in project(&set, &config).markers {
            assert!(marker.screen_x <= config.max_screen_x());
            assert!(marker.screen_y <= config.max_screen_y());
        }
    }

    #[test]
    fn steep_rates_are_emphasized() {
        let set = set_of(vec![sample(9000.0, 200.0, -15.0), sample(9000.0, 200.0, 10.0)]);
        let projection = project(&set, &PlotConfig::default());
        assert!(projection.markers[0].emphasized);
        assert_eq!(projection.markers[0].stack_order, 3);
        assert_eq!(projection.markers[0].color, MarkerColor::rgb(255, 0, 0));
        assert!(!projection.markers[1].emphasized);
        assert_eq!(projection.emphasized_count(), 1);
    }

    #[test]
    fn marker_carries_converted_units() {
        let set = set_of(vec![sample(10000.0, 250.0, 0.0)]);
        let marker = &project(&set, &PlotConfig::default()).markers[0];
        assert_eq!(marker.flight_level, 328);
        assert_eq!(marker.speed_knots, 489);
        assert_eq!(marker.annotation.trend, "Level flight at FL 328");
    }

    #[test]
    fn stage_rejects_invalid_config() {
        let mut stage = ProjectorStage::new();
        let config = PlotConfig {
            vertical_rate_scale: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            stage.initialize(&config),
            Err(StageError::InvalidConfig(_))
        ));
    }

    #[test]
    fn stage_projects_sample_set() {
        let mut stage = ProjectorStage::new();
        stage.initialize(&PlotConfig::default()).unwrap();
        let output = stage
            .execute(set_of(vec![sample(7000.0, 180.0, 12.0)]))
            .unwrap();
        assert_eq!(output.metadata.marker_count, Some(1));
        assert!(output.metadata.notes[0].starts_with("1 markers, 1 emphasized"));
        assert_eq!(output.payload.labels.speed, "Velocity range is from 0 to 405 mi/hr");
        stage.cleanup();
    }
}

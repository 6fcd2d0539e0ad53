use crate::workflow::runner::{RenderOutcome, WorkflowResult};
use serde::{Deserialize, Serialize};
use skyplotcore::math::Extrema;
use skyplotcore::processing::{AxisLabels, Marker, NormalizationDiagnostics};

/// Latest render pass as served to the visualizer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub plot_width: u32,
    pub plot_height: u32,
    pub marker_size: u32,
    pub snapshot_time: Option<i64>,
    pub markers: Vec<Marker>,
    pub labels: Option<AxisLabels>,
    pub extrema: Option<Extrema>,
    pub diagnostics: NormalizationDiagnostics,
    /// Set when the last snapshot held no usable flights.
    pub empty: bool,
    pub notes: Vec<String>,
}

impl VisualizationModel {
    pub fn from_result(result: &WorkflowResult) -> Self {
        let base = Self {
            snapshot_time: result.snapshot_time,
            diagnostics: result.diagnostics,
            notes: result.notes.clone(),
            ..Default::default()
        };

        match &result.outcome {
            RenderOutcome::Rendered {
                projection,
                extrema,
            } => Self {
                plot_width: projection.plot_width,
                plot_height: projection.plot_height,
                marker_size: projection.marker_size,
                markers: projection.markers.clone(),
                labels: Some(projection.labels.clone()),
                extrema: Some(*extrema),
                ..base
            },
            RenderOutcome::Empty => Self { empty: true, ..base },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_snapshot;
    use crate::workflow::config::WorkflowConfig;
    use crate::workflow::runner::Runner;
    use skyplotcore::feed::StateSnapshot;

    #[test]
    fn model_carries_rendered_pass() {
        let runner = Runner::new(WorkflowConfig::default());
        let result = runner.execute(build_snapshot(40, 2).unwrap()).unwrap();
        let model = VisualizationModel::from_result(&result);

        assert!(!model.empty);
        assert_eq!(model.plot_width, 1000);
        assert_eq!(model.markers.len(), result.diagnostics.accepted);
        assert!(model.labels.is_some());

        let json = serde_json::to_string(&model).unwrap();
        let decoded: VisualizationModel = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.markers, model.markers);
    }

    #[test]
    fn model_flags_empty_pass() {
        let runner = Runner::new(WorkflowConfig::default());
        let result = runner.execute(StateSnapshot::default()).unwrap();
        let model = VisualizationModel::from_result(&result);
        assert!(model.empty);
        assert!(model.markers.is_empty());
        assert!(model.labels.is_none());
    }
}

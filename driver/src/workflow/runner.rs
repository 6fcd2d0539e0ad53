use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use skyplotcore::feed::StateSnapshot;
use skyplotcore::math::Extrema;
use skyplotcore::prelude::ProcessingStage;
use skyplotcore::processing::{
    NormalizationDiagnostics, Normalized, NormalizerStage, Projection, ProjectorStage,
};
use skyplotcore::telemetry::{MetricsRecorder, PassCounts};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Rendered {
        projection: Projection,
        extrema: Extrema,
    },
    /// No record survived validation; there is nothing to draw.
    Empty,
}

#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub snapshot_time: Option<i64>,
    pub outcome: RenderOutcome,
    pub diagnostics: NormalizationDiagnostics,
    pub notes: Vec<String>,
}

impl WorkflowResult {
    pub fn marker_count(&self) -> usize {
        match &self.outcome {
            RenderOutcome::Rendered { projection, .. } => projection.markers.len(),
            RenderOutcome::Empty => 0,
        }
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn metrics(&self) -> PassCounts {
        self.metrics.snapshot()
    }

    /// Counts a pass that never reached the pipeline because the fetch failed.
    pub fn record_upstream_failure(&self) {
        self.metrics.record_failed();
    }

    /// Runs one full render pass over `snapshot`.
    pub fn execute(&self, snapshot: StateSnapshot) -> anyhow::Result<WorkflowResult> {
        let result = self.run_stages(snapshot);
        match &result {
            Ok(WorkflowResult {
                outcome: RenderOutcome::Rendered { projection, .. },
                ..
            }) => self.metrics.record_rendered(projection.markers.len()),
            Ok(_) => self.metrics.record_empty(),
            Err(_) => self.metrics.record_failed(),
        }
        result
    }

    fn run_stages(&self, snapshot: StateSnapshot) -> anyhow::Result<WorkflowResult> {
        let StateSnapshot { time, states } = snapshot;
        let plot_config = self.config.to_plot_config();

        let mut normalizer = NormalizerStage::new();
        normalizer
            .initialize(&plot_config)
            .context("initializing normalizer stage")?;
        let normalized = normalizer
            .execute(states)
            .context("executing normalizer stage")?;
        normalizer.cleanup();

        let diagnostics = normalized.payload.diagnostics;
        let mut notes = normalized.metadata.notes;

        let set = match normalized.payload.outcome {
            Normalized::Ready(set) => set,
            Normalized::Empty => {
                return Ok(WorkflowResult {
                    snapshot_time: time,
                    outcome: RenderOutcome::Empty,
                    diagnostics,
                    notes,
                })
            }
        };
        let extrema = set.extrema;

        let mut projector = ProjectorStage::new();
        projector
            .initialize(&plot_config)
            .context("initializing projector stage")?;
        let projected = projector
            .execute(set)
            .context("executing projector stage")?;
        projector.cleanup();

        notes.extend(projected.metadata.notes);

        Ok(WorkflowResult {
            snapshot_time: time,
            outcome: RenderOutcome::Rendered {
                projection: projected.payload,
                extrema,
            },
            diagnostics,
            notes,
        })
    }
}

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::feed::RawRecord;
use crate::math::extrema::{Extrema, ExtremaTracker};
use crate::prelude::{
    PlotConfig, ProcessingStage, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Smallest altitude (m) and ground speed (m/s) a sample may carry.
pub const VALUE_FLOOR: f64 = 1.0;

/// A validated, unit-normalized flight accepted into the render set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSample {
    /// Barometric altitude in meters, at least [`VALUE_FLOOR`].
    pub altitude: f64,
    /// Ground speed in m/s, at least [`VALUE_FLOOR`].
    pub ground_speed: f64,
    /// Climb (positive) or descent (negative) rate in m/s; 0 when unreported.
    pub vertical_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
}

/// Samples of one snapshot together with their bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    pub samples: Vec<FlightSample>,
    pub extrema: Extrema,
}

/// Result of a normalization pass. `Empty` means there is nothing to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Ready(SampleSet),
    Empty,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        matches!(self, Normalized::Empty)
    }

    pub fn into_sample_set(self) -> Option<SampleSet> {
        match self {
            Normalized::Ready(set) => Some(set),
            Normalized::Empty => None,
        }
    }
}

/// Record counts of one pass. A single record may be counted under several
/// rejection reasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationDiagnostics {
    pub total: usize,
    pub accepted: usize,
    pub altitude_missing: usize,
    pub ground_speed_missing: usize,
    pub grounded: usize,
}

impl NormalizationDiagnostics {
    pub fn rejected(&self) -> usize {
        self.total - self.accepted
    }
}

/// Why a record was left out of the sample set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordRejection {
    pub altitude_missing: bool,
    pub ground_speed_missing: bool,
    pub grounded: bool,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<&str> = [
            (self.altitude_missing, "altitude missing"),
            (self.ground_speed_missing, "ground speed missing"),
            (self.grounded, "on ground"),
        ]
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, reason)| *reason)
        .collect();
        write!(f, "{}", reasons.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeReport {
    pub outcome: Normalized,
    pub diagnostics: NormalizationDiagnostics,
}

/// Zero and NaN readings are indistinguishable from an unreported value.
fn usable(reading: Option<f64>) -> Option<f64> {
    reading.filter(|value| *value != 0.0 && !value.is_nan())
}

/// Validates one record and converts it into a sample.
pub fn accept(record: &RawRecord) -> Result<FlightSample, RecordRejection> {
    let altitude = usable(record.baro_altitude);
    let ground_speed = usable(record.velocity);

    match (altitude, ground_speed) {
        (Some(altitude), Some(ground_speed)) if !record.on_ground => Ok(FlightSample {
            altitude: altitude.max(VALUE_FLOOR),
            ground_speed: ground_speed.max(VALUE_FLOOR),
            vertical_rate: usable(record.vertical_rate).unwrap_or(0.0),
            callsign: record.callsign.clone(),
        }),
        _ => Err(RecordRejection {
            altitude_missing: altitude.is_none(),
            ground_speed_missing: ground_speed.is_none(),
            grounded: record.on_ground,
        }),
    }
}

/// Filters a snapshot's records into samples and derives their extrema in one pass.
pub fn normalize(records: &[RawRecord]) -> NormalizeReport {
    let mut diagnostics = NormalizationDiagnostics {
        total: records.len(),
        ..Default::default()
    };
    let mut tracker = ExtremaTracker::new();
    let mut samples = Vec::with_capacity(records.len());

    for record in records {
        match accept(record) {
            Ok(sample) => {
                tracker.observe(sample.altitude, sample.ground_speed, sample.vertical_rate);
                samples.push(sample);
            }
            Err(rejection) => {
                diagnostics.altitude_missing += usize::from(rejection.altitude_missing);
                diagnostics.ground_speed_missing += usize::from(rejection.ground_speed_missing);
                diagnostics.grounded += usize::from(rejection.grounded);
                debug!(
                    "dropped {}: {}",
                    record.icao24.as_deref().unwrap_or("<unknown>"),
                    rejection
                );
            }
        }
    }
    diagnostics.accepted = samples.len();

    let outcome = match tracker.finish() {
        Some(extrema) => Normalized::Ready(SampleSet { samples, extrema }),
        None => Normalized::Empty,
    };

    NormalizeReport {
        outcome,
        diagnostics,
    }
}

/// Stage wrapper around [`normalize`] that reports a pass summary.
pub struct NormalizerStage {
    config: Option<PlotConfig>,
    logger: LogManager,
}

impl NormalizerStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("normalizer"),
        }
    }
}

impl Default for NormalizerStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for NormalizerStage {
    type Input = Vec<RawRecord>;
    type Output = NormalizeReport;

    fn initialize(&mut self, config: &PlotConfig) -> StageResult<()> {
        config.validate()?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Vec<RawRecord>) -> StageResult<StageOutput<NormalizeReport>> {
        if self.config.is_none() {
            return Err(StageError::Internal("stage not initialized".into()));
        }

        let report = normalize(&input);
        let diagnostics = report.diagnostics;

        let mut notes = vec![format!(
            "{} valid flights from {} total",
            diagnostics.accepted, diagnostics.total
        )];
        self.logger.record(&notes[0]);

        match &report.outcome {
            Normalized::Ready(set) => {
                let extrema = &set.extrema;
                let note = format!(
                    "alt {} {} vel {} {} vert {} {}",
                    extrema.altitude.min,
                    extrema.altitude.max,
                    extrema.ground_speed.min,
                    extrema.ground_speed.max,
                    extrema.vertical_rate.min,
                    extrema.vertical_rate.max
                );
                self.logger.record(&note);
                notes.push(note);
            }
            Normalized::Empty => {
                let note = "no usable data; extrema undefined".to_string();
                self.logger.caution(&note);
                notes.push(note);
            }
        }

        let note = format!(
            "missing alt {} missing vel {} grounded {}",
            diagnostics.altitude_missing, diagnostics.ground_speed_missing, diagnostics.grounded
        );
        self.logger.record(&note);
        notes.push(note);

        Ok(StageOutput {
            payload: report,
            metadata: StageMetadata {
                notes,
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

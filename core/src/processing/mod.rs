pub mod annotation;
pub mod color;
pub mod normalizer;
pub mod projector;

pub use annotation::{Annotation, AxisLabels};
pub use color::{MarkerColor, VerticalTrend};
pub use normalizer::{
    normalize, FlightSample, NormalizationDiagnostics, NormalizeReport, Normalized,
    NormalizerStage, SampleSet,
};
pub use projector::{project, HorizontalAnchor, Marker, Projection, ProjectorStage};

use serde::{Deserialize, Serialize};

use crate::math::extrema::Extrema;
use crate::math::units::{flight_level, group_thousands, meters_to_feet, mps_to_knots, mps_to_mph};
use crate::processing::color::VerticalTrend;
use crate::processing::normalizer::FlightSample;

pub const LEGEND: &str = "Red flights are descending, green flights are ascending, \
white are level flight (or no data)";

/// Hover text of one marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub trend: String,
    pub velocity: String,
}

impl Annotation {
    pub fn lines(&self) -> [&str; 2] {
        [self.trend.as_str(), self.velocity.as_str()]
    }
}

pub fn annotate(sample: &FlightSample) -> Annotation {
    let level = group_thousands(flight_level(sample.altitude));
    let rate = sample.vertical_rate.ceil() as i64;

    let trend = match VerticalTrend::from_rate(sample.vertical_rate) {
        VerticalTrend::Ascending => format!("Flight is ascending from FL {level} at {rate} m/s"),
        VerticalTrend::Descending => {
            format!("Flight is descending from FL {level} at {rate} m/s")
        }
        VerticalTrend::Level => format!("Level flight at FL {level}"),
    };
    let velocity = format!(
        "Velocity is {} knots across the ground",
        group_thousands(mps_to_knots(sample.ground_speed))
    );

    Annotation { trend, velocity }
}

/// Axis summaries shown beside the plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub min_altitude_ft: i64,
    pub max_altitude_ft: i64,
    pub max_speed_mph: i64,
    pub altitude: String,
    pub speed: String,
    pub legend: String,
}

pub fn axis_labels(extrema: &Extrema) -> AxisLabels {
    let min_altitude_ft = meters_to_feet(extrema.altitude.min);
    let max_altitude_ft = meters_to_feet(extrema.altitude.max);
    let max_speed_mph = mps_to_mph(extrema.ground_speed.max);

    AxisLabels {
        min_altitude_ft,
        max_altitude_ft,
        max_speed_mph,
        altitude: format!(
            "Altitude range is from {}ft to {}ft",
            group_thousands(min_altitude_ft),
            group_thousands(max_altitude_ft)
        ),
        speed: format!(
            "Velocity range is from 0 to {} mi/hr",
            group_thousands(max_speed_mph)
        ),
        legend: LEGEND.to_string(),
    }
}

use serde::{Deserialize, Serialize};

/// Closed interval observed on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Population-wide bounds of the accepted samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    pub altitude: Bounds,
    pub ground_speed: Bounds,
    pub vertical_rate: Bounds,
}

/// Running min/max that starts at sentinels outside any valid value.
#[derive(Debug, Clone, Copy)]
struct BoundsTracker {
    min: f64,
    max: f64,
}

impl BoundsTracker {
    const fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn observe(&mut self, value: f64) {
        if value > self.max {
            self.max = value;
        }
        if value < self.min {
            self.min = value;
        }
    }

    fn finish(self) -> Option<Bounds> {
        if self.max == f64::NEG_INFINITY || self.min == f64::INFINITY {
            None
        } else {
            Some(Bounds {
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Single-pass extrema accumulator for altitude, ground speed and vertical rate.
#[derive(Debug, Clone, Copy)]
pub struct ExtremaTracker {
    altitude: BoundsTracker,
    ground_speed: BoundsTracker,
    vertical_rate: BoundsTracker,
}

impl ExtremaTracker {
    pub const fn new() -> Self {
        Self {
            altitude: BoundsTracker::new(),
            ground_speed: BoundsTracker::new(),
            vertical_rate: BoundsTracker::new(),
        }
    }

    pub fn observe(&mut self, altitude: f64, ground_speed: f64, vertical_rate: f64) {
        self.altitude.observe(altitude);
        self.ground_speed.observe(ground_speed);
        self.vertical_rate.observe(vertical_rate);
    }

    /// Returns `None` while any tracker still holds its sentinel, i.e. nothing was observed.
    pub fn finish(self) -> Option<Extrema> {
        Some(Extrema {
            altitude: self.altitude.finish()?,
            ground_speed: self.ground_speed.finish()?,
            vertical_rate: self.vertical_rate.finish()?,
        })
    }
}

impl Default for ExtremaTracker {
    fn default() -> Self {
        Self::new()
    }
}

//! Unit conversions used for marker annotations and axis labels.
//!
//! The speed factors follow the plot's established labelling: km/h is derived
//! with 3.6, miles use 1.6 km and knots are 1.151 mi/h.

pub const FEET_PER_METER: f64 = 3.28084;
pub const KMH_PER_MPS: f64 = 3.6;
pub const KM_PER_MILE: f64 = 1.6;
pub const MPH_PER_KNOT: f64 = 1.151;

/// Meters to whole feet, rounded up.
pub fn meters_to_feet(meters: f64) -> i64 {
    (meters * FEET_PER_METER).ceil() as i64
}

/// Altitude in hundreds of feet, rounded down.
pub fn flight_level(meters: f64) -> i64 {
    (meters * FEET_PER_METER / 100.0).floor() as i64
}

/// Meters per second to whole miles per hour, rounded up.
pub fn mps_to_mph(mps: f64) -> i64 {
    (mps * KMH_PER_MPS / KM_PER_MILE).ceil() as i64
}

/// Meters per second to whole knots, rounded up.
pub fn mps_to_knots(mps: f64) -> i64 {
    (mps * KMH_PER_MPS / KM_PER_MILE / MPH_PER_KNOT).ceil() as i64
}

/// Formats an integer with `,` between groups of three digits.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_level_rounds_down() {
        assert_eq!(flight_level(10000.0), 328);
        assert_eq!(flight_level(1.0), 0);
    }

    #[test]
    fn feet_round_up() {
        assert_eq!(meters_to_feet(10000.0), 32809);
        assert_eq!(meters_to_feet(1.0), 4);
    }

    #[test]
    fn speed_conversions_round_up() {
        assert_eq!(mps_to_mph(250.0), 563);
        assert_eq!(mps_to_knots(250.0), 489);
    }

    #[test]
    fn groups_digits_in_threes() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(32809), "32,809");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-45000), "-45,000");
    }
}

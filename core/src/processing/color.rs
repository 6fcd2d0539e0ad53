use serde::{Deserialize, Serialize};

/// Direction of vertical motion, by sign of the vertical rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalTrend {
    Ascending,
    Descending,
    Level,
}

impl VerticalTrend {
    pub fn from_rate(vertical_rate: f64) -> Self {
        if vertical_rate > 0.0 {
            VerticalTrend::Ascending
        } else if vertical_rate < 0.0 {
            VerticalTrend::Descending
        } else {
            VerticalTrend::Level
        }
    }
}

/// 8-bit RGB marker color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl MarkerColor {
    pub const WHITE: MarkerColor = MarkerColor::rgb(255, 255, 255);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Climbs shade from white towards green, descents towards red. `scale` is the
    /// rate (m/s) at which the two remaining channels reach zero; faster rates stay
    /// fully saturated.
    pub fn from_vertical_rate(vertical_rate: f64, scale: f64) -> Self {
        match VerticalTrend::from_rate(vertical_rate) {
            VerticalTrend::Ascending => {
                let fade = faded_channel(vertical_rate, scale);
                Self::rgb(fade, 255, fade)
            }
            VerticalTrend::Descending => {
                let fade = faded_channel(vertical_rate, -scale);
                Self::rgb(255, fade, fade)
            }
            VerticalTrend::Level => Self::WHITE,
        }
    }

    pub fn css(&self) -> String {
        if *self == Self::WHITE {
            "white".to_string()
        } else {
            format!("rgb({},{},{})", self.red, self.green, self.blue)
        }
    }
}

/// `255 - ceil(rate * 255 / scale)`, clamped into the channel range.
fn faded_channel(vertical_rate: f64, scale: f64) -> u8 {
    let fade = (vertical_rate * 255.0 / scale).ceil();
    (255.0 - fade).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_flight_is_white() {
        assert_eq!(MarkerColor::from_vertical_rate(0.0, 10.0), MarkerColor::WHITE);
        assert_eq!(MarkerColor::WHITE.css(), "white");
    }

    #[test]
    fn climb_saturates_green() {
        let color = MarkerColor::from_vertical_rate(5.0, 10.0);
        assert_eq!(color, MarkerColor::rgb(127, 255, 127));
        assert_eq!(color.css(), "rgb(127,255,127)");

        let steeper = MarkerColor::from_vertical_rate(8.0, 10.0);
        assert!(steeper.red < color.red);
        assert_eq!(steeper.red, steeper.blue);
    }

    #[test]
    fn descent_saturates_red() {
        let color = MarkerColor::from_vertical_rate(-5.0, 10.0);
        assert_eq!(color, MarkerColor::rgb(255, 127, 127));

        let steeper = MarkerColor::from_vertical_rate(-9.0, 10.0);
        assert!(steeper.green < color.green);
        assert_eq!(steeper.green, steeper.blue);
    }

    #[test]
    fn rates_beyond_scale_clamp_to_full_saturation() {
        assert_eq!(
            MarkerColor::from_vertical_rate(42.0, 10.0),
            MarkerColor::rgb(0, 255, 0)
        );
        assert_eq!(
            MarkerColor::from_vertical_rate(-42.0, 10.0),
            MarkerColor::rgb(255, 0, 0)
        );
    }

    #[test]
    fn tiny_climb_is_not_white() {
        let color = MarkerColor::from_vertical_rate(0.01, 10.0);
        assert_eq!(color, MarkerColor::rgb(254, 255, 254));
        assert_eq!(VerticalTrend::from_rate(0.01), VerticalTrend::Ascending);
    }
}

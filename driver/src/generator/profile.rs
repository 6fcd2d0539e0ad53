use anyhow::ensure;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use skyplotcore::feed::{RawRecord, StateSnapshot};

const SNAPSHOT_EPOCH: i64 = 1_700_000_000;
const OPERATORS: [&str; 8] = ["DLH", "BAW", "AFR", "UAL", "SWR", "KLM", "DAL", "QFA"];
const COUNTRIES: [&str; 6] = [
    "Germany",
    "United Kingdom",
    "France",
    "United States",
    "Switzerland",
    "Australia",
];

/// Configuration for generating synthetic state snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub flights: usize,
    pub seed: u64,
    /// Share of records reported on the ground.
    pub grounded_fraction: f64,
    /// Share of records lacking altitude or ground speed.
    pub missing_fraction: f64,
    /// Share of airborne records without a vertical rate.
    pub level_fraction: f64,
    pub max_altitude_m: f64,
    pub max_ground_speed_mps: f64,
    pub max_vertical_rate_mps: f64,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            flights: 400,
            seed: 0,
            grounded_fraction: 0.08,
            missing_fraction: 0.05,
            level_fraction: 0.35,
            max_altitude_m: 12_500.0,
            max_ground_speed_mps: 280.0,
            max_vertical_rate_mps: 18.0,
            description: None,
            scenario: None,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<()> {
        for (name, fraction) in [
            ("grounded_fraction", self.grounded_fraction),
            ("missing_fraction", self.missing_fraction),
            ("level_fraction", self.level_fraction),
        ] {
            ensure!(
                (0.0..=1.0).contains(&fraction),
                "{name} must be within [0, 1], got {fraction}"
            );
        }
        ensure!(
            self.max_altitude_m > 300.0,
            "max_altitude_m must exceed 300 m, got {}",
            self.max_altitude_m
        );
        ensure!(
            self.max_ground_speed_mps > 60.0,
            "max_ground_speed_mps must exceed 60 m/s, got {}",
            self.max_ground_speed_mps
        );
        ensure!(
            self.max_vertical_rate_mps > 0.0,
            "max_vertical_rate_mps must be positive, got {}",
            self.max_vertical_rate_mps
        );
        Ok(())
    }
}

fn build_record(rng: &mut StdRng, config: &GeneratorConfig) -> RawRecord {
    let operator = OPERATORS[rng.gen_range(0..OPERATORS.len())];
    let flight_number: u16 = rng.gen_range(1..10_000);
    let altitude = rng.gen_range(300.0..config.max_altitude_m);
    let record = RawRecord {
        icao24: Some(format!("{:06x}", rng.gen_range(0..0x100_0000u32))),
        callsign: Some(format!("{:<8}", format!("{operator}{flight_number}"))),
        origin_country: Some(COUNTRIES[rng.gen_range(0..COUNTRIES.len())].to_string()),
        time_position: Some(SNAPSHOT_EPOCH - rng.gen_range(0..15)),
        last_contact: Some(SNAPSHOT_EPOCH),
        longitude: Some(rng.gen_range(-180.0..180.0)),
        latitude: Some(rng.gen_range(-70.0..70.0)),
        baro_altitude: Some(altitude),
        on_ground: false,
        velocity: Some(rng.gen_range(60.0..config.max_ground_speed_mps)),
        true_track: Some(rng.gen_range(0.0..360.0)),
        vertical_rate: None,
        sensors: None,
        geo_altitude: Some(altitude + rng.gen_range(-60.0..60.0)),
        squawk: Some(format!("{:04o}", rng.gen_range(0..0o10000u32))),
        spi: false,
        position_source: Some(0),
        category: None,
    };

    if rng.gen_bool(config.grounded_fraction) {
        return RawRecord {
            on_ground: true,
            baro_altitude: None,
            geo_altitude: None,
            velocity: Some(rng.gen_range(0.0..15.0)),
            ..record
        };
    }
    if rng.gen_bool(config.missing_fraction) {
        return if rng.gen_bool(0.5) {
            RawRecord {
                baro_altitude: None,
                ..record
            }
        } else {
            RawRecord {
                velocity: None,
                ..record
            }
        };
    }
    if rng.gen_bool(config.level_fraction) {
        return record;
    }

    let limit = config.max_vertical_rate_mps;
    RawRecord {
        vertical_rate: Some(rng.gen_range(-limit..limit)),
        ..record
    }
}

pub fn build_snapshot_from_config(config: &GeneratorConfig) -> anyhow::Result<StateSnapshot> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let states = (0..config.flights)
        .map(|_| build_record(&mut rng, config))
        .collect();
    Ok(StateSnapshot::new(Some(SNAPSHOT_EPOCH), states))
}

pub fn build_snapshot(flights: usize, seed: u64) -> anyhow::Result<StateSnapshot> {
    let config = GeneratorConfig {
        flights,
        seed,
        ..Default::default()
    };
    build_snapshot_from_config(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyplotcore::processing::normalize;

    #[test]
    fn generator_builds_expected_record_count() {
        let snapshot = build_snapshot(120, 3).unwrap();
        assert_eq!(snapshot.len(), 120);
        assert_eq!(snapshot.time, Some(SNAPSHOT_EPOCH));
        assert!(snapshot
            .states
            .iter()
            .all(|record| record.callsign.as_ref().map(String::len) == Some(8)));
    }

    #[test]
    fn same_seed_repeats_snapshot() {
        assert_eq!(build_snapshot(32, 11).unwrap(), build_snapshot(32, 11).unwrap());
    }

    #[test]
    fn fully_grounded_scenario_normalizes_to_empty() {
        let config = GeneratorConfig {
            flights: 25,
            grounded_fraction: 1.0,
            ..Default::default()
        };
        let snapshot = build_snapshot_from_config(&config).unwrap();
        let report = normalize(&snapshot.states);
        assert!(report.outcome.is_empty());
        assert_eq!(report.diagnostics.grounded, 25);
    }

    #[test]
    fn clean_scenario_keeps_every_record() {
        let config = GeneratorConfig {
            flights: 50,
            seed: 9,
            grounded_fraction: 0.0,
            missing_fraction: 0.0,
            ..Default::default()
        };
        let snapshot = build_snapshot_from_config(&config).unwrap();
        assert_eq!(normalize(&snapshot.states).diagnostics.accepted, 50);
    }

    #[test]
    fn generator_rejects_bad_fractions() {
        let config = GeneratorConfig {
            missing_fraction: 1.5,
            ..Default::default()
        };
        assert!(build_snapshot_from_config(&config).is_err());
    }
}

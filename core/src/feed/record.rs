use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Offsets of the state-vector fields inside one upstream `states` entry.
///
/// The feed sends every aircraft as a positional array; this table is the only
/// place those positions are known. Entries shorter than the table simply lack
/// the trailing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum StateField {
    /// ICAO 24-bit transponder address, hex encoded.
    Icao24 = 0,
    Callsign = 1,
    OriginCountry = 2,
    /// Unix seconds of the last position update.
    TimePosition = 3,
    /// Unix seconds of the last message of any kind.
    LastContact = 4,
    Longitude = 5,
    Latitude = 6,
    /// Barometric altitude in meters.
    BaroAltitude = 7,
    OnGround = 8,
    /// Ground speed in m/s.
    Velocity = 9,
    /// True track in degrees clockwise from north.
    TrueTrack = 10,
    /// Vertical rate in m/s, positive when climbing.
    VerticalRate = 11,
    /// Ids of the receivers that contributed to this state.
    Sensors = 12,
    /// Geometric altitude in meters.
    GeoAltitude = 13,
    Squawk = 14,
    /// Special purpose indicator.
    Spi = 15,
    PositionSource = 16,
    /// Aircraft category, only present on extended requests.
    Category = 17,
}

impl StateField {
    pub const fn offset(self) -> usize {
        self as usize
    }
}

/// One aircraft's last-known state, decoded from its positional array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct RawRecord {
    pub icao24: Option<String>,
    pub callsign: Option<String>,
    pub origin_country: Option<String>,
    pub time_position: Option<i64>,
    pub last_contact: Option<i64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    pub velocity: Option<f64>,
    pub true_track: Option<f64>,
    pub vertical_rate: Option<f64>,
    pub sensors: Option<Vec<i64>>,
    pub geo_altitude: Option<f64>,
    pub squawk: Option<String>,
    pub spi: bool,
    pub position_source: Option<i64>,
    pub category: Option<i64>,
}

impl RawRecord {
    /// Decodes a positional state array. Values of the wrong JSON type count as absent.
    pub fn from_fields(fields: &[Value]) -> Self {
        let field = |name: StateField| fields.get(name.offset());

        Self {
            icao24: text(field(StateField::Icao24)),
            callsign: text(field(StateField::Callsign)),
            origin_country: text(field(StateField::OriginCountry)),
            time_position: integer(field(StateField::TimePosition)),
            last_contact: integer(field(StateField::LastContact)),
            longitude: number(field(StateField::Longitude)),
            latitude: number(field(StateField::Latitude)),
            baro_altitude: number(field(StateField::BaroAltitude)),
            on_ground: truthy(field(StateField::OnGround)),
            velocity: number(field(StateField::Velocity)),
            true_track: number(field(StateField::TrueTrack)),
            vertical_rate: number(field(StateField::VerticalRate)),
            sensors: field(StateField::Sensors)
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_i64).collect()),
            geo_altitude: number(field(StateField::GeoAltitude)),
            squawk: text(field(StateField::Squawk)),
            spi: truthy(field(StateField::Spi)),
            position_source: integer(field(StateField::PositionSource)),
            category: integer(field(StateField::Category)),
        }
    }

    /// Encodes the record back into the feed's positional layout.
    pub fn to_fields(&self) -> Vec<Value> {
        let mut fields = vec![
            json!(self.icao24),
            json!(self.callsign),
            json!(self.origin_country),
            json!(self.time_position),
            json!(self.last_contact),
            json!(self.longitude),
            json!(self.latitude),
            json!(self.baro_altitude),
            json!(self.on_ground),
            json!(self.velocity),
            json!(self.true_track),
            json!(self.vertical_rate),
            json!(self.sensors),
            json!(self.geo_altitude),
            json!(self.squawk),
            json!(self.spi),
            json!(self.position_source),
        ];
        if let Some(category) = self.category {
            fields.push(json!(category));
        }
        fields
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(fields) => Self::from_fields(&fields),
            _ => Self::default(),
        }
    }
}

impl From<RawRecord> for Value {
    fn from(record: RawRecord) -> Self {
        Value::Array(record.to_fields())
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn integer(value: Option<&Value>) -> Option<i64> {
    value.and_then(Value::as_i64)
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_owned)
}

/// Flag semantics of the feed: `true`, non-zero numbers and non-empty strings are set.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}

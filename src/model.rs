use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Whole-unit operating mode shared by every zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneMode {
    #[default]
    Auto,
    Off,
    Manual,
    Party,
    Holiday,
}

impl ZoneMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneMode::Auto => "auto",
            ZoneMode::Off => "off",
            ZoneMode::Manual => "manual",
            ZoneMode::Party => "party",
            ZoneMode::Holiday => "holiday",
        }
    }
}

/// Active thermal function of the unit. Distinct from [`SeasonName`]:
/// category can be `off` while the season is still winter or summer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Heating,
    Cooling,
    #[default]
    Off,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Heating => "heating",
            Category::Cooling => "cooling",
            Category::Off => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonName {
    #[default]
    Winter,
    Summer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Season {
    pub id: SeasonName,
}

/// Tag deciding when a setpoint temperature applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetpointType {
    #[default]
    Present,
    Absent,
    /// Currently-applied target as computed by the backend. Shown read-only
    /// in automatic mode; written only where the vendor protocol expects it.
    Effective,
}

impl SetpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetpointType::Present => "present",
            SetpointType::Absent => "absent",
            SetpointType::Effective => "effective",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    #[serde(rename = "type")]
    pub kind: SetpointType,
    pub temperature: f64,
}

/// Weekday codes in the fixed order the vendor schedule uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "MON",
            Weekday::Tue => "TUE",
            Weekday::Wed => "WED",
            Weekday::Thu => "THU",
            Weekday::Fri => "FRI",
            Weekday::Sat => "SAT",
            Weekday::Sun => "SUN",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandTime {
    pub hour: u8,
    pub min: u8,
}

/// One contiguous interval within a weekday during which a setpoint type is
/// active. Treated as an opaque interval: overlap validation is the server's
/// responsibility, not ours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub id: u32,
    #[serde(rename = "setpointType")]
    pub setpoint_type: SetpointType,
    pub start: BandTime,
    pub end: BandTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: Weekday,
    pub bands: Vec<Band>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Calendar {
    /// Band granularity in minutes (15 or 30).
    pub step: u32,
    pub schedule: Vec<DaySchedule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub steps: u32,
    pub step_value: f64,
    pub present_max_temp: f64,
    pub present_min_temp: f64,
    pub absent_max_temp: f64,
    pub absent_min_temp: f64,
    /// When set, the present setpoint is shared across all zones rather
    /// than kept per-zone. Same for `absent_is_unique`.
    pub present_is_unique: bool,
    pub absent_is_unique: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            steps: 0,
            step_value: 0.5,
            present_max_temp: 30.0,
            present_min_temp: 5.0,
            absent_max_temp: 30.0,
            absent_min_temp: 5.0,
            present_is_unique: false,
            absent_is_unique: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManualLimits {
    pub min_temp: f64,
    pub max_temp: f64,
    pub steps: u32,
    pub step_value: f64,
}

impl Default for ManualLimits {
    fn default() -> Self {
        Self {
            min_temp: 5.0,
            max_temp: 30.0,
            steps: 0,
            step_value: 0.5,
        }
    }
}

/// One independently controlled area of the unit, keyed by a stable
/// numeric-string id. Zones can disappear from the snapshot entirely on a
/// season change; consumers must treat a missing zone as unavailable, never
/// as a zone full of defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Zone {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub at_home: bool,
    pub at_home_for_scheduler: bool,
    pub effective_setpoint: f64,
    pub setpoints: Vec<Setpoint>,
    pub mode: ZoneMode,
    pub setpoint_selected: SetpointType,
    pub holiday_active: bool,
    /// Remaining duration for party/holiday overrides. Unit depends on the
    /// mode; surfaced as-is.
    pub expiration: Option<i64>,
    pub date_expiration: Option<String>,
    pub current_manual_temperature: f64,
    pub calendar: Option<Calendar>,
}

impl Zone {
    /// Temperature of the setpoint with the given tag, if present.
    /// At most one setpoint per type exists in a zone at any time.
    pub fn setpoint(&self, kind: SetpointType) -> Option<f64> {
        self.setpoints
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.temperature)
    }
}

/// Immutable whole-unit snapshot. Created by a successful fetch, replaced
/// wholesale by the next one, never mutated in place.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThermostatState {
    pub provider: String,
    #[serde(rename = "unitCode")]
    pub unit_code: String,
    #[serde(rename = "measureUnit")]
    pub measure_unit: String,
    #[serde(rename = "externalTemperature")]
    pub external_temperature: f64,
    pub category: Category,
    pub season: Season,
    pub zones: Vec<Zone>,
    pub limits: Limits,
    pub manual_limits: ManualLimits,
}

impl Default for ThermostatState {
    fn default() -> Self {
        Self {
            provider: String::new(),
            unit_code: String::new(),
            measure_unit: "C".to_string(),
            external_temperature: 0.0,
            category: Category::Off,
            season: Season::default(),
            zones: Vec::new(),
            limits: Limits::default(),
            manual_limits: ManualLimits::default(),
        }
    }
}

impl ThermostatState {
    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }
}

/// Zone ids come back as `"1"` from some backend versions and as `1` from
/// others; normalize both to the string key.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "zone id must be a string or number, got {other}"
        ))),
    }
}

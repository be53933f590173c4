//! ESO Phase 2 (p2) objects as exchanged with the p2 REST API.
//!
//! Field names are snake_case in Rust and camelCase on the wire. Objects are
//! plain records: p2 round-trips them with a `version` tag, so the usual
//! workflow is fetch, edit fields, save.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelResult, ValidationError};
use crate::models::angle::SexagesimalUnit;
use crate::models::target::SiderealTarget;
use crate::models::time::TimeValue;
use crate::models::window::Window;

const MAS_PER_ARCSEC: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub airmass: f64,
    /// Fractional lunar illumination.
    pub fli: f64,
    pub moon_distance: i64,
    pub name: String,
    pub seeing: f64,
    pub sky_transparency: String,
    pub twilight: i64,
    pub water_vapour: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObsDescription {
    pub instrument_comments: String,
    pub name: String,
    pub user_comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// `[-]DD:MM:SS.sss`
    pub dec: String,
    pub differential_dec: f64,
    pub differential_ra: f64,
    pub epoch: f64,
    pub equinox: String,
    pub name: String,
    /// arcsec/yr
    pub proper_motion_dec: f64,
    /// arcsec/yr
    pub proper_motion_ra: f64,
    /// `HH:MM:SS.sss`
    pub ra: String,
}

impl Target {
    /// Point this p2 target at `target`, copying its name, coordinates,
    /// proper motion and epoch.
    pub fn use_sidereal_target(&mut self, target: &SiderealTarget) {
        self.name = target.name().clone();
        self.ra = target.ra().to_sexagesimal(SexagesimalUnit::Hours, 3);
        self.dec = target.dec().to_sexagesimal(SexagesimalUnit::Degrees, 3);
        self.proper_motion_ra = target.proper_motion_ra() / MAS_PER_ARCSEC;
        self.proper_motion_dec = target.proper_motion_dec() / MAS_PER_ARCSEC;
        self.epoch = *target.epoch();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBlock {
    pub version: String,
    pub constraints: Constraints,
    pub obs_description: ObsDescription,
    pub target: Target,
    pub execution_time: i64,
    pub exposure_time: i64,
    pub instrument: String,
    pub ip_version: f64,
    pub item_type: String,
    pub migrate: bool,
    #[serde(default = "default_grade")]
    pub grade: String,
    pub name: String,
    pub ob_id: i64,
    pub ob_status: String,
    pub parent_container_id: i64,
    pub run_id: i64,
    pub user_priority: i64,
}

fn default_grade() -> String {
    "?".to_string()
}

/// A folder, group or concatenation holding observation blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub container_id: i64,
    pub item_count: i64,
    pub item_type: String,
    pub name: String,
    pub parent_container_id: i64,
    pub run_id: i64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub template_id: i64,
    pub template_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Parameter objects as defined by the instrument package.
    pub parameters: Vec<Map<String, Value>>,
    pub version: String,
}

/// An absolute observing interval; `from`/`to` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteTimeConstraint {
    #[serde(rename = "from")]
    pub start: TimeValue,
    #[serde(rename = "to")]
    pub end: TimeValue,
}

impl AbsoluteTimeConstraint {
    /// p2 has no open-start intervals, so `window` must have a start.
    pub fn from_window(window: &Window) -> ModelResult<Self> {
        let start = (*window.start()).ok_or_else(|| ValidationError::missing("start"))?;
        Ok(Self {
            start,
            end: *window.end(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteTimeConstraints {
    pub constraints: Vec<AbsoluteTimeConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A local sidereal time interval, `HH:MM` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiderealTimeConstraint {
    #[serde(rename = "from", with = "hh_mm")]
    pub start: NaiveTime,
    #[serde(rename = "to", with = "hh_mm")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiderealTimeConstraints {
    pub constraints: Vec<SiderealTimeConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Ephemeris file contents for a moving target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ephemeris {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    // Seconds are accepted on input and dropped by the next save.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid sidereal time '{}': {}", text, e)))
    }
}

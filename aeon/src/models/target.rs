//! Pointing targets: fixed-coordinate (sidereal) and orbital/tracking
//! (non-sidereal), combined in the [`Target`] union tagged by `type`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, ModelResult, ValidationError};
use crate::models::angle::AngleValue;
use crate::models::rules;
use crate::models::time::TimeValue;

const NAME_MAX_LEN: usize = 50;

crate::string_enum! {
    pub enum SiderealType {
        Icrs => "ICRS",
        HourAngle => "HOUR_ANGLE",
        AltAz => "ALTAZ",
    }
}

crate::string_enum! {
    pub enum NonSiderealType {
        OrbitalElements => "ORBITAL_ELEMENTS",
        Satellite => "SATELLITE",
    }
}

crate::string_enum! {
    /// Orbital element convention.
    pub enum Scheme {
        AsaMajorPlanet => "ASA_MAJOR_PLANET",
        AsaMinorPlanet => "ASA_MINOR_PLANET",
        AsaComet => "ASA_COMET",
        JplMajorPlanet => "JPL_MAJOR_PLANET",
        JplMinorPlanet => "JPL_MINOR_PLANET",
        MpcMinorPlanet => "MPC_MINOR_PLANET",
        MpcComet => "MPC_COMET",
    }
}

fn angle_within(angle: &AngleValue, lo: f64, hi: f64) -> ModelResult<()> {
    rules::within(angle.degrees(), lo, hi)
}

fn mjd_within(time: &TimeValue, lo: f64, hi: f64) -> ModelResult<()> {
    rules::within(time.mjd().value(), lo, hi)
}

fn any_angle(angle: &AngleValue) -> ModelResult<()> {
    rules::within(angle.degrees(), f64::MIN, f64::MAX)
}

fn any_number(value: &f64) -> ModelResult<()> {
    rules::within(*value, f64::MIN, f64::MAX)
}

// =========================================================================
// Sidereal
// =========================================================================

/// A target at fixed celestial coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSiderealTarget")]
pub struct SiderealTarget {
    name: String,
    #[serde(rename = "type")]
    kind: SiderealType,
    ra: AngleValue,
    dec: AngleValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    hour_angle: Option<AngleValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    altitude: Option<AngleValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    azimuth: Option<AngleValue>,
    /// mas/yr
    proper_motion_ra: f64,
    /// mas/yr
    proper_motion_dec: f64,
    /// Julian year of the coordinates.
    epoch: f64,
    /// mas
    parallax: f64,
}

crate::validated_fields! {
    SiderealTarget {
        name / set_name: String = |v| rules::max_len(v, NAME_MAX_LEN);
        kind / set_kind: SiderealType = |_| Ok(());
        /// Right ascension, `[0, 360)` degrees.
        ra / set_ra: AngleValue = |v| {
            rules::ge(v.degrees(), 0.0)?;
            rules::lt(v.degrees(), 360.0)
        };
        /// Declination, `[-90, 90]` degrees.
        dec / set_dec: AngleValue = |v| angle_within(v, -90.0, 90.0);
        hour_angle / set_hour_angle: Option<AngleValue> = |v| rules::optional(v, any_angle);
        altitude / set_altitude: Option<AngleValue> = |v| rules::optional(v, |a| angle_within(a, 0.0, 90.0));
        azimuth / set_azimuth: Option<AngleValue> = |v| rules::optional(v, |a| angle_within(a, 0.0, 360.0));
        proper_motion_ra / set_proper_motion_ra: f64 = |v| rules::magnitude(*v, 20_000.0);
        proper_motion_dec / set_proper_motion_dec: f64 = |v| rules::magnitude(*v, 20_000.0);
        epoch / set_epoch: f64 = |v| rules::le(*v, 2100.0);
        parallax / set_parallax: f64 = |v| rules::le(*v, 2000.0);
    }
}

impl SiderealTarget {
    /// An ICRS target at epoch 2000 with no proper motion or parallax.
    pub fn new(
        name: impl Into<String>,
        ra: impl Into<AngleValue>,
        dec: impl Into<AngleValue>,
    ) -> ModelResult<Self> {
        let target = Self {
            name: name.into(),
            kind: SiderealType::Icrs,
            ra: ra.into(),
            dec: dec.into(),
            hour_angle: None,
            altitude: None,
            azimuth: None,
            proper_motion_ra: 0.0,
            proper_motion_dec: 0.0,
            epoch: 2000.0,
            parallax: 0.0,
        };
        target.validate_fields()?;
        Ok(target)
    }
}

#[derive(Deserialize)]
struct RawSiderealTarget {
    name: String,
    #[serde(rename = "type")]
    kind: SiderealType,
    ra: AngleValue,
    dec: AngleValue,
    #[serde(default)]
    hour_angle: Option<AngleValue>,
    #[serde(default)]
    altitude: Option<AngleValue>,
    #[serde(default)]
    azimuth: Option<AngleValue>,
    #[serde(default)]
    proper_motion_ra: Option<f64>,
    #[serde(default)]
    proper_motion_dec: Option<f64>,
    #[serde(default)]
    epoch: Option<f64>,
    #[serde(default)]
    parallax: Option<f64>,
}

impl TryFrom<RawSiderealTarget> for SiderealTarget {
    type Error = ValidationError;

    fn try_from(raw: RawSiderealTarget) -> Result<Self, Self::Error> {
        let target = Self {
            name: raw.name,
            kind: raw.kind,
            ra: raw.ra,
            dec: raw.dec,
            hour_angle: raw.hour_angle,
            altitude: raw.altitude,
            azimuth: raw.azimuth,
            proper_motion_ra: raw.proper_motion_ra.unwrap_or(0.0),
            proper_motion_dec: raw.proper_motion_dec.unwrap_or(0.0),
            epoch: raw.epoch.unwrap_or(2000.0),
            parallax: raw.parallax.unwrap_or(0.0),
        };
        target.validate_fields()?;
        Ok(target)
    }
}

// =========================================================================
// Non-sidereal
// =========================================================================

/// The orbital elements every non-sidereal target carries.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElements {
    /// Epoch of elements.
    pub epochofel: TimeValue,
    /// Inclination, degrees.
    pub orbinc: AngleValue,
    /// Longitude of the ascending node, degrees.
    pub longascnode: AngleValue,
    /// Argument of perihelion, degrees.
    pub argofperih: AngleValue,
    pub eccentricity: f64,
    /// Mean distance (semi-major axis), AU.
    pub meandist: f64,
    /// Mean anomaly, degrees.
    pub meananom: AngleValue,
}

/// A solar-system or tracked target described by orbital elements.
///
/// Comet-only fields (`perihdist`, `epochofperih`) are rejected on
/// `SATELLITE` targets and satellite rate fields (`diff_*`) are rejected on
/// `ORBITAL_ELEMENTS` targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNonSiderealTarget")]
pub struct NonSiderealTarget {
    name: String,
    #[serde(rename = "type")]
    kind: NonSiderealType,
    scheme: Scheme,
    epochofel: TimeValue,
    orbinc: AngleValue,
    longascnode: AngleValue,
    argofperih: AngleValue,
    eccentricity: f64,
    meandist: f64,
    meananom: AngleValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    perihdist: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    epochofperih: Option<TimeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dailymot: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meanlong: Option<AngleValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longofperih: Option<AngleValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    altitude: Option<AngleValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    azimuth: Option<AngleValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_altitude_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_azimuth_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_epoch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_altitude_acceleration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_azimuth_acceleration: Option<f64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    extra_params: Map<String, Value>,
}

crate::validated_fields! {
    NonSiderealTarget {
        name / set_name: String = |v| rules::max_len(v, NAME_MAX_LEN);
        kind / set_kind: NonSiderealType = |_| Ok(());
        scheme / set_scheme: Scheme = |_| Ok(());
        /// Epoch of elements, MJD `[10000, 100000]`.
        epochofel / set_epochofel: TimeValue = |v| mjd_within(v, 10_000.0, 100_000.0);
        orbinc / set_orbinc: AngleValue = |v| angle_within(v, 0.0, 180.0);
        longascnode / set_longascnode: AngleValue = |v| angle_within(v, 0.0, 360.0);
        argofperih / set_argofperih: AngleValue = |v| angle_within(v, 0.0, 360.0);
        eccentricity / set_eccentricity: f64 = |v| rules::ge(*v, 0.0);
        meandist / set_meandist: f64 = |v| rules::ge(*v, 0.0);
        meananom / set_meananom: AngleValue = |v| angle_within(v, 0.0, 360.0);
        /// Perihelion distance, AU (comets).
        perihdist / set_perihdist: Option<f64> = |v| rules::optional(v, |d| rules::ge(*d, 0.0));
        /// Epoch of perihelion, MJD `[361, 100000]` (comets).
        epochofperih / set_epochofperih: Option<TimeValue> = |v| rules::optional(v, |t| mjd_within(t, 361.0, 100_000.0));
        /// Daily motion, degrees/day.
        dailymot / set_dailymot: Option<f64> = |v| rules::optional(v, any_number);
        meanlong / set_meanlong: Option<AngleValue> = |v| rules::optional(v, |a| angle_within(a, 0.0, 360.0));
        longofperih / set_longofperih: Option<AngleValue> = |v| rules::optional(v, |a| angle_within(a, 0.0, 360.0));
        altitude / set_altitude: Option<AngleValue> = |v| rules::optional(v, |a| angle_within(a, 0.0, 90.0));
        azimuth / set_azimuth: Option<AngleValue> = |v| rules::optional(v, |a| angle_within(a, 0.0, 360.0));
        diff_altitude_rate / set_diff_altitude_rate: Option<f64> = |v| rules::optional(v, any_number);
        diff_azimuth_rate / set_diff_azimuth_rate: Option<f64> = |v| rules::optional(v, any_number);
        diff_epoch / set_diff_epoch: Option<f64> = |v| rules::optional(v, any_number);
        diff_altitude_acceleration / set_diff_altitude_acceleration: Option<f64> = |v| rules::optional(v, any_number);
        diff_azimuth_acceleration / set_diff_azimuth_acceleration: Option<f64> = |v| rules::optional(v, any_number);
        extra_params / set_extra_params: Map<String, Value> = |_| Ok(());
    } cross NonSiderealTarget::check_type_fields
}

impl NonSiderealTarget {
    pub fn new(
        name: impl Into<String>,
        kind: NonSiderealType,
        scheme: Scheme,
        elements: OrbitalElements,
    ) -> ModelResult<Self> {
        let target = Self {
            name: name.into(),
            kind,
            scheme,
            epochofel: elements.epochofel,
            orbinc: elements.orbinc,
            longascnode: elements.longascnode,
            argofperih: elements.argofperih,
            eccentricity: elements.eccentricity,
            meandist: elements.meandist,
            meananom: elements.meananom,
            perihdist: None,
            epochofperih: None,
            dailymot: None,
            meanlong: None,
            longofperih: None,
            altitude: None,
            azimuth: None,
            diff_altitude_rate: None,
            diff_azimuth_rate: None,
            diff_epoch: None,
            diff_altitude_acceleration: None,
            diff_azimuth_acceleration: None,
            extra_params: Map::new(),
        };
        target.validate_fields()?;
        Ok(target)
    }

    fn check_type_fields(&self) -> ModelResult<()> {
        let (forbidden, reason) = match self.kind {
            NonSiderealType::Satellite => (
                vec![
                    ("perihdist", self.perihdist.is_some()),
                    ("epochofperih", self.epochofperih.is_some()),
                ],
                "comet elements are not used by SATELLITE targets",
            ),
            NonSiderealType::OrbitalElements => (
                vec![
                    ("diff_altitude_rate", self.diff_altitude_rate.is_some()),
                    ("diff_azimuth_rate", self.diff_azimuth_rate.is_some()),
                    ("diff_epoch", self.diff_epoch.is_some()),
                    ("diff_altitude_acceleration", self.diff_altitude_acceleration.is_some()),
                    ("diff_azimuth_acceleration", self.diff_azimuth_acceleration.is_some()),
                ],
                "satellite rates are not used by ORBITAL_ELEMENTS targets",
            ),
        };
        match forbidden.into_iter().find(|(_, set)| *set) {
            Some((field, _)) => Err(ValidationError::not_permitted(reason).in_field(field)),
            None => Ok(()),
        }
    }
}

#[derive(Deserialize)]
struct RawNonSiderealTarget {
    name: String,
    #[serde(rename = "type")]
    kind: NonSiderealType,
    scheme: Scheme,
    epochofel: TimeValue,
    orbinc: AngleValue,
    longascnode: AngleValue,
    argofperih: AngleValue,
    eccentricity: f64,
    meandist: f64,
    meananom: AngleValue,
    #[serde(default)]
    perihdist: Option<f64>,
    #[serde(default)]
    epochofperih: Option<TimeValue>,
    #[serde(default)]
    dailymot: Option<f64>,
    #[serde(default)]
    meanlong: Option<AngleValue>,
    #[serde(default)]
    longofperih: Option<AngleValue>,
    #[serde(default)]
    altitude: Option<AngleValue>,
    #[serde(default)]
    azimuth: Option<AngleValue>,
    #[serde(default)]
    diff_altitude_rate: Option<f64>,
    #[serde(default)]
    diff_azimuth_rate: Option<f64>,
    #[serde(default)]
    diff_epoch: Option<f64>,
    #[serde(default)]
    diff_altitude_acceleration: Option<f64>,
    #[serde(default)]
    diff_azimuth_acceleration: Option<f64>,
    #[serde(default)]
    extra_params: Option<Map<String, Value>>,
}

impl TryFrom<RawNonSiderealTarget> for NonSiderealTarget {
    type Error = ValidationError;

    fn try_from(raw: RawNonSiderealTarget) -> Result<Self, Self::Error> {
        let target = Self {
            name: raw.name,
            kind: raw.kind,
            scheme: raw.scheme,
            epochofel: raw.epochofel,
            orbinc: raw.orbinc,
            longascnode: raw.longascnode,
            argofperih: raw.argofperih,
            eccentricity: raw.eccentricity,
            meandist: raw.meandist,
            meananom: raw.meananom,
            perihdist: raw.perihdist,
            epochofperih: raw.epochofperih,
            dailymot: raw.dailymot,
            meanlong: raw.meanlong,
            longofperih: raw.longofperih,
            altitude: raw.altitude,
            azimuth: raw.azimuth,
            diff_altitude_rate: raw.diff_altitude_rate,
            diff_azimuth_rate: raw.diff_azimuth_rate,
            diff_epoch: raw.diff_epoch,
            diff_altitude_acceleration: raw.diff_altitude_acceleration,
            diff_azimuth_acceleration: raw.diff_azimuth_acceleration,
            extra_params: raw.extra_params.unwrap_or_default(),
        };
        target.validate_fields()?;
        Ok(target)
    }
}

// =========================================================================
// Union
// =========================================================================

/// Either kind of target, selected on the wire by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Target {
    Sidereal(SiderealTarget),
    NonSidereal(NonSiderealTarget),
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Sidereal(t) => t.name(),
            Target::NonSidereal(t) => t.name(),
        }
    }

    /// The wire `type` value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Target::Sidereal(t) => t.kind().as_str(),
            Target::NonSidereal(t) => t.kind().as_str(),
        }
    }

    pub fn as_sidereal(&self) -> Option<&SiderealTarget> {
        match self {
            Target::Sidereal(t) => Some(t),
            Target::NonSidereal(_) => None,
        }
    }

    pub fn as_non_sidereal(&self) -> Option<&NonSiderealTarget> {
        match self {
            Target::NonSidereal(t) => Some(t),
            Target::Sidereal(_) => None,
        }
    }

    pub fn as_sidereal_mut(&mut self) -> Option<&mut SiderealTarget> {
        match self {
            Target::Sidereal(t) => Some(t),
            Target::NonSidereal(_) => None,
        }
    }

    pub fn as_non_sidereal_mut(&mut self) -> Option<&mut NonSiderealTarget> {
        match self {
            Target::NonSidereal(t) => Some(t),
            Target::Sidereal(_) => None,
        }
    }

    fn expected_types() -> Vec<String> {
        SiderealType::NAMES
            .iter()
            .chain(NonSiderealType::NAMES)
            .map(|s| s.to_string())
            .collect()
    }
}

impl From<SiderealTarget> for Target {
    fn from(t: SiderealTarget) -> Self {
        Target::Sidereal(t)
    }
}

impl From<NonSiderealTarget> for Target {
    fn from(t: NonSiderealTarget) -> Self {
        Target::NonSidereal(t)
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .ok_or_else(|| D::Error::custom(ValidationError::missing("type")))?
            .as_str()
            .ok_or_else(|| D::Error::custom("target `type` must be a string"))?
            .to_string();

        if SiderealType::NAMES.contains(&kind.as_str()) {
            crate::payload::from_value_with_path::<SiderealTarget>(value)
                .map(Target::Sidereal)
                .map_err(D::Error::custom)
        } else if NonSiderealType::NAMES.contains(&kind.as_str()) {
            crate::payload::from_value_with_path::<NonSiderealTarget>(value)
                .map(Target::NonSidereal)
                .map_err(D::Error::custom)
        } else {
            Err(D::Error::custom(ValidationError::at(
                "type",
                ErrorKind::UnknownVariant {
                    value: kind,
                    expected: Target::expected_types(),
                },
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::TimeScale;

    fn elements() -> OrbitalElements {
        OrbitalElements {
            epochofel: TimeValue::from_mjd(60676.0, TimeScale::Utc).unwrap(),
            orbinc: 10.0.into(),
            longascnode: 80.0.into(),
            argofperih: 73.0.into(),
            eccentricity: 0.09,
            meandist: 2.77,
            meananom: 120.0.into(),
        }
    }

    #[test]
    fn test_sidereal_defaults() {
        let t = SiderealTarget::new("M51", 202.469, 47.195).unwrap();
        assert_eq!(*t.kind(), SiderealType::Icrs);
        assert_eq!(*t.epoch(), 2000.0);
        assert_eq!(*t.parallax(), 0.0);
    }

    #[test]
    fn test_sidereal_ra_upper_bound_is_open() {
        let err = SiderealTarget::new("x", 360.0, 0.0).unwrap_err();
        assert_eq!(err.field(), Some("ra"));
        assert_eq!(err.code(), "less_than");
    }

    #[test]
    fn test_sidereal_name_too_long() {
        let err = SiderealTarget::new("n".repeat(51), 1.0, 1.0).unwrap_err();
        assert_eq!(err.field(), Some("name"));
        assert_eq!(err.code(), "string_too_long");
    }

    #[test]
    fn test_sidereal_assignment_validates() {
        let mut t = SiderealTarget::new("x", 10.0, 20.0).unwrap();
        let err = t.set_dec(91.0).unwrap_err();
        assert_eq!(err.field(), Some("dec"));
        assert_eq!(t.dec().degrees(), 20.0);
        assert_eq!(t.set_proper_motion_ra(-20_001.0).unwrap_err().code(), "greater_than_equal");
        assert_eq!(t.set_epoch(2101.0).unwrap_err().code(), "less_than_equal");
        t.set_ra("1h".parse::<AngleValue>().unwrap()).unwrap();
        assert_eq!(t.ra().degrees(), 15.0);
    }

    #[test]
    fn test_sidereal_serializes_angles_as_strings() {
        let t = SiderealTarget::new("x", 10.0, 20.0).unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["ra"], "10");
        assert_eq!(json["dec"], "20");
        assert_eq!(json["type"], "ICRS");
        assert!(json.get("hour_angle").is_none());
    }

    #[test]
    fn test_non_sidereal_ranges() {
        let mut bad = elements();
        bad.orbinc = 181.0.into();
        let err = NonSiderealTarget::new("C", NonSiderealType::OrbitalElements, Scheme::MpcMinorPlanet, bad)
            .unwrap_err();
        assert_eq!(err.field(), Some("orbinc"));

        let mut early = elements();
        early.epochofel = TimeValue::from_mjd(9_999.0, TimeScale::Utc).unwrap();
        let err = NonSiderealTarget::new("C", NonSiderealType::OrbitalElements, Scheme::MpcMinorPlanet, early)
            .unwrap_err();
        assert_eq!(err.field(), Some("epochofel"));
    }

    #[test]
    fn test_satellite_rejects_comet_fields() {
        let mut t = NonSiderealTarget::new("SAT", NonSiderealType::Satellite, Scheme::JplMajorPlanet, elements())
            .unwrap();
        let err = t.set_perihdist(1.2).unwrap_err();
        assert_eq!(err.code(), "extra_forbidden");
        assert_eq!(err.field(), Some("perihdist"));
        assert_eq!(*t.perihdist(), None);
        t.set_diff_altitude_rate(0.5).unwrap();
    }

    #[test]
    fn test_orbital_elements_rejects_satellite_rates() {
        let mut t = NonSiderealTarget::new("C", NonSiderealType::OrbitalElements, Scheme::MpcComet, elements())
            .unwrap();
        t.set_perihdist(1.2).unwrap();
        assert_eq!(t.set_diff_epoch(60000.0).unwrap_err().field(), Some("diff_epoch"));
        // switching type is checked against the populated fields
        assert!(t.set_kind(NonSiderealType::Satellite).is_err());
        assert_eq!(*t.kind(), NonSiderealType::OrbitalElements);
    }

    #[test]
    fn test_target_dispatch_on_type() {
        let sidereal: Target =
            serde_json::from_str(r#"{"name":"x","type":"ICRS","ra":"10","dec":"20"}"#).unwrap();
        assert!(sidereal.as_sidereal().is_some());

        let err = serde_json::from_str::<Target>(r#"{"name":"x","type":"COMET","ra":"10","dec":"20"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown variant 'COMET'"));
    }

    #[test]
    fn test_non_sidereal_json_roundtrip() {
        let mut t = NonSiderealTarget::new("C", NonSiderealType::OrbitalElements, Scheme::MpcComet, elements())
            .unwrap();
        t.set_epochofperih(TimeValue::from_mjd(60700.0, TimeScale::Utc).unwrap()).unwrap();
        let target = Target::from(t);
        let json = serde_json::to_string(&target).unwrap();
        let back: Target = serde_json::from_str(&json).unwrap();
        assert_eq!(back, target);
    }
}

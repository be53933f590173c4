//! Instants: the MJD carrier type and the wire-facing [`TimeValue`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// MJD of the Unix epoch (1970-01-01T00:00:00).
const MJD_UNIX_EPOCH: f64 = 40587.0;
/// JD − MJD.
const JD_MJD_OFFSET: f64 = 2_400_000.5;
const SECONDS_PER_DAY: f64 = 86_400.0;
const MICROS_PER_DAY: f64 = 86_400_000_000.0;
/// Two instants closer than one millisecond compare equal.
const EQUALITY_TOLERANCE_DAYS: f64 = 1e-3 / SECONDS_PER_DAY;
/// 0001-01-01T00:00:00 and 9999-12-31T23:59:59.999999, the span an ISO string can carry.
const MJD_MIN: f64 = -678_575.0;
const MJD_MAX: f64 = 2_973_484.0;

/// Modified Julian Date representation.
/// MJD 0 = 1858-11-17 00:00:00
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ModifiedJulianDate(qtty::Days);

impl ModifiedJulianDate {
    /// Create a new MJD value.
    pub fn new<V: Into<qtty::Days>>(v: V) -> Self {
        Self(v.into())
    }

    /// Raw MJD value as f64.
    pub fn value(&self) -> f64 {
        self.0.value()
    }

    /// Julian Date of the same instant.
    pub fn to_julian_date(&self) -> f64 {
        self.value() + JD_MJD_OFFSET
    }

    pub fn from_julian_date(jd: f64) -> Self {
        Self::new(jd - JD_MJD_OFFSET)
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        (self.value() - MJD_UNIX_EPOCH) * SECONDS_PER_DAY
    }

    /// Create from Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn from_unix_timestamp(timestamp: f64) -> Self {
        Self::new(timestamp / SECONDS_PER_DAY + MJD_UNIX_EPOCH)
    }

    /// Calendar reading, rounded to the microsecond. `None` outside chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let micros = ((self.value() - MJD_UNIX_EPOCH) * MICROS_PER_DAY).round();
        if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
            return None;
        }
        let micros = micros as i64;
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
        DateTime::from_timestamp(micros.div_euclid(1_000_000), nanos)
    }

    /// Create from chrono DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let days = dt.timestamp().div_euclid(86_400) as f64;
        let rest = dt.timestamp().rem_euclid(86_400) as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9;
        Self::new(MJD_UNIX_EPOCH + days + rest / SECONDS_PER_DAY)
    }
}

impl From<f64> for ModifiedJulianDate {
    fn from(v: f64) -> Self {
        ModifiedJulianDate::new(v)
    }
}

crate::string_enum! {
    /// Astronomical time scale a [`TimeValue`] is expressed in.
    pub enum TimeScale {
        Utc => "utc",
        Tai => "tai",
        Tt => "tt",
        Tdb => "tdb",
    }
}

crate::string_enum! {
    /// Output representation for fields listed in a payload output mapping.
    pub enum TimeFormat {
        /// ISO-8601 calendar string (the default wire form).
        Datetime => "datetime",
        Isot => "isot",
        Mjd => "mjd",
        Jd => "jd",
        Unix => "unix",
    }
}

/// An instant, stored as an MJD in a given time scale.
///
/// Serialized as an ISO-8601 calendar string (`2025-04-10T00:00:00`, with a
/// six-digit fraction only when the instant is not on a whole second).
/// Deserializes from such a string (optionally with `Z` or an offset) or from
/// a bare number read as a UTC MJD.
#[derive(Debug, Clone, Copy)]
pub struct TimeValue {
    mjd: ModifiedJulianDate,
    scale: TimeScale,
}

impl TimeValue {
    pub fn from_modified_julian_date(
        mjd: ModifiedJulianDate,
        scale: TimeScale,
    ) -> Result<Self, ParseError> {
        let value = mjd.value();
        if !value.is_finite() || !(MJD_MIN..MJD_MAX).contains(&value) {
            return Err(ParseError::time(
                value.to_string(),
                "MJD outside the representable calendar range",
            ));
        }
        Ok(Self { mjd, scale })
    }

    pub fn from_mjd(value: f64, scale: TimeScale) -> Result<Self, ParseError> {
        Self::from_modified_julian_date(ModifiedJulianDate::new(value), scale)
    }

    pub fn from_jd(value: f64, scale: TimeScale) -> Result<Self, ParseError> {
        Self::from_modified_julian_date(ModifiedJulianDate::from_julian_date(value), scale)
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            mjd: ModifiedJulianDate::from_datetime(dt),
            scale: TimeScale::Utc,
        }
    }

    /// Calendar reading in the given scale.
    pub fn from_naive(naive: NaiveDateTime, scale: TimeScale) -> Self {
        Self {
            mjd: ModifiedJulianDate::from_datetime(naive.and_utc()),
            scale,
        }
    }

    /// Parse an ISO-8601 string as a UTC instant.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Self::parse_in_scale(input, TimeScale::Utc)
    }

    /// Parse an ISO-8601 calendar string read in `scale`.
    ///
    /// Accepts a `T` or space separator, an optional fraction, an optional `Z`
    /// or numeric offset (converted to UTC), and bare dates.
    pub fn parse_in_scale(input: &str, scale: TimeScale) -> Result<Self, ParseError> {
        let text = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::from_naive(dt.naive_utc(), scale));
        }
        const NAIVE_FORMATS: [&str; 4] = [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ];
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Self::from_naive(naive, scale));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Self::from_naive(date.and_time(chrono::NaiveTime::default()), scale));
        }
        Err(ParseError::time(input, "expected an ISO-8601 date or date-time"))
    }

    pub fn mjd(&self) -> ModifiedJulianDate {
        self.mjd
    }

    pub fn jd(&self) -> f64 {
        self.mjd.to_julian_date()
    }

    pub fn unix(&self) -> f64 {
        self.mjd.to_unix_timestamp()
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Calendar reading of this instant in its own scale, to the microsecond.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        // Construction keeps the MJD inside the ISO span, which chrono covers.
        self.mjd.to_datetime().unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn to_iso_string(&self) -> String {
        let dt = self.to_datetime();
        let whole = dt.format("%Y-%m-%dT%H:%M:%S");
        let micros = dt.nanosecond() / 1_000;
        if micros == 0 {
            whole.to_string()
        } else {
            format!("{}.{:06}", whole, micros)
        }
    }

    /// This instant in the requested wire representation.
    pub fn represent(&self, format: TimeFormat) -> serde_json::Value {
        match format {
            TimeFormat::Datetime | TimeFormat::Isot => serde_json::Value::String(self.to_iso_string()),
            TimeFormat::Mjd => serde_json::json!(self.mjd.value()),
            TimeFormat::Jd => serde_json::json!(self.jd()),
            TimeFormat::Unix => serde_json::json!(self.unix()),
        }
    }
}

/// Compares calendar readings. The ISO wire form does not carry the scale,
/// so it is not part of a value's identity.
impl PartialEq for TimeValue {
    fn eq(&self, other: &Self) -> bool {
        (self.mjd.value() - other.mjd.value()).abs() < EQUALITY_TOLERANCE_DAYS
    }
}

impl PartialOrd for TimeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        self.mjd.value().partial_cmp(&other.mjd.value())
    }
}

impl From<DateTime<Utc>> for TimeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl From<NaiveDateTime> for TimeValue {
    fn from(naive: NaiveDateTime) -> Self {
        Self::from_naive(naive, TimeScale::Utc)
    }
}

impl FromStr for TimeValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl Serialize for TimeValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for TimeValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimeVisitor;

        impl serde::de::Visitor<'_> for TimeVisitor {
            type Value = TimeValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an ISO-8601 date-time string or an MJD number")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<TimeValue, E> {
                TimeValue::parse(v).map_err(E::custom)
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<TimeValue, E> {
                TimeValue::from_mjd(v, TimeScale::Utc).map_err(E::custom)
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<TimeValue, E> {
                self.visit_f64(v as f64)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<TimeValue, E> {
                self.visit_f64(v as f64)
            }
        }

        deserializer.deserialize_any(TimeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mjd_unix_epoch_is_calendar_epoch() {
        let epoch = ModifiedJulianDate::from_unix_timestamp(0.0);
        assert_eq!(epoch.value(), MJD_UNIX_EPOCH);
        assert_eq!(epoch.to_datetime(), Some(DateTime::UNIX_EPOCH));
    }

    #[test]
    fn test_calendar_range_limits() {
        let first = TimeValue::from_mjd(MJD_MIN, TimeScale::Utc).unwrap();
        assert_eq!(first.to_iso_string(), "0001-01-01T00:00:00");
        assert!(TimeValue::from_mjd(MJD_MIN - 1.0, TimeScale::Utc).is_err());
        let last = TimeValue::from_mjd(MJD_MAX - 1.0, TimeScale::Utc).unwrap();
        assert_eq!(last.to_iso_string(), "9999-12-31T00:00:00");
        assert!(TimeValue::from_mjd(MJD_MAX, TimeScale::Utc).is_err());
    }

    #[test]
    fn test_mjd_julian_date_offset() {
        let mjd = ModifiedJulianDate::from_julian_date(2_460_676.5);
        assert_eq!(mjd.value(), 60676.0);
        assert_eq!(mjd.to_julian_date(), 2_460_676.5);
    }

    #[test]
    fn test_time_from_mjd_serializes_iso() {
        let t = TimeValue::from_mjd(60775.0, TimeScale::Utc).unwrap();
        assert_eq!(t.to_iso_string(), "2025-04-10T00:00:00");
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"2025-04-10T00:00:00\"");
    }

    #[test]
    fn test_time_from_datetime_keeps_micros() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 1, 12, 30, 15).unwrap()
            + chrono::Duration::microseconds(250_000);
        let t = TimeValue::from_datetime(dt);
        assert_eq!(t.to_iso_string(), "2025-01-01T12:30:15.250000");
        assert_eq!(t.mjd().value(), 60676.0 + (12.0 * 3600.0 + 30.0 * 60.0 + 15.25) / 86400.0);
    }

    #[test]
    fn test_time_parse_variants() {
        let expected = TimeValue::from_mjd(60775.5, TimeScale::Utc).unwrap();
        for text in [
            "2025-04-10T12:00:00",
            "2025-04-10 12:00:00",
            "2025-04-10T12:00:00Z",
            "2025-04-10T12:00:00.000000",
            "2025-04-10T14:00:00+02:00",
            "2025-04-10T12:00",
        ] {
            assert_eq!(TimeValue::parse(text).unwrap(), expected, "{}", text);
        }
        assert_eq!(
            TimeValue::parse("2025-04-10").unwrap(),
            TimeValue::from_mjd(60775.0, TimeScale::Utc).unwrap()
        );
    }

    #[test]
    fn test_time_parse_rejects_garbage() {
        let err = TimeValue::parse("next tuesday").unwrap_err();
        assert!(matches!(err, ParseError::InvalidTime { .. }));
    }

    #[test]
    fn test_time_rejects_non_finite_mjd() {
        assert!(TimeValue::from_mjd(f64::NAN, TimeScale::Utc).is_err());
        assert!(TimeValue::from_mjd(1e12, TimeScale::Utc).is_err());
    }

    #[test]
    fn test_time_jd_in_tt() {
        let t = TimeValue::from_jd(2_460_676.5, TimeScale::Tt).unwrap();
        assert_eq!(t.mjd().value(), 60676.0);
        assert_eq!(t.scale(), TimeScale::Tt);
        assert_eq!(t.represent(TimeFormat::Mjd), serde_json::json!(60676.0));
    }

    #[test]
    fn test_time_equality_ignores_scale() {
        let utc = TimeValue::from_mjd(60000.0, TimeScale::Utc).unwrap();
        let tt = TimeValue::from_mjd(60000.0, TimeScale::Tt).unwrap();
        assert_eq!(utc, tt);
        assert_eq!(utc.partial_cmp(&tt), Some(Ordering::Equal));
        let later = TimeValue::from_mjd(60000.5, TimeScale::Tai).unwrap();
        assert!(utc < later);
    }

    #[test]
    fn test_tt_time_survives_json() {
        let tt = TimeValue::from_jd(2_460_676.5, TimeScale::Tt).unwrap();
        let json = serde_json::to_string(&tt).unwrap();
        assert_eq!(json, "\"2025-01-01T00:00:00\"");
        let back: TimeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tt);
        assert_eq!(back.scale(), TimeScale::Utc);
    }

    #[test]
    fn test_time_deserializes_number_as_mjd() {
        let t: TimeValue = serde_json::from_str("60775").unwrap();
        assert_eq!(t.to_iso_string(), "2025-04-10T00:00:00");
    }

    #[test]
    fn test_time_roundtrip_through_json() {
        let dt = Utc.with_ymd_and_hms(2031, 7, 4, 3, 2, 1).unwrap()
            + chrono::Duration::microseconds(123_456);
        let t = TimeValue::from(dt);
        let json = serde_json::to_string(&t).unwrap();
        let back: TimeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}

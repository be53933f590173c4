//! Angular values carried by targets.
//!
//! An [`AngleValue`] always holds degrees internally and is written to the
//! wire as a decimal-degree string (`10.0` becomes `"10"`, `"1h"` becomes
//! `"15"`). Input may be a number of degrees, a `qtty` angle, or a string in
//! one of the forms accepted by [`AngleValue::parse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Unit a sexagesimal string is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SexagesimalUnit {
    Hours,
    Degrees,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Hour,
    Degree,
    Radian,
    Arcminute,
    Arcsecond,
    MilliArcsecond,
}

impl Unit {
    fn lookup(symbol: &str) -> Option<Self> {
        match symbol {
            "h" | "hr" | "hour" | "hours" | "hourangle" => Some(Unit::Hour),
            "d" | "deg" | "degree" | "degrees" | "°" => Some(Unit::Degree),
            "rad" | "radian" | "radians" => Some(Unit::Radian),
            "arcmin" | "'" => Some(Unit::Arcminute),
            "arcsec" | "\"" => Some(Unit::Arcsecond),
            "mas" => Some(Unit::MilliArcsecond),
            _ => None,
        }
    }

    fn to_degrees(self, value: f64) -> qtty::Degrees {
        match self {
            Unit::Hour => qtty::HourAngles::new(value).to::<qtty::Degree>(),
            Unit::Degree => qtty::Degrees::new(value),
            Unit::Radian => qtty::Radians::new(value).to::<qtty::Degree>(),
            Unit::Arcminute => qtty::Arcminutes::new(value).to::<qtty::Degree>(),
            Unit::Arcsecond => qtty::Arcseconds::new(value).to::<qtty::Degree>(),
            Unit::MilliArcsecond => qtty::MilliArcseconds::new(value).to::<qtty::Degree>(),
        }
    }

    /// Units that may lead a compound `1h2m3s` / `10d20m30s` string.
    fn is_sexagesimal(self) -> bool {
        matches!(self, Unit::Hour | Unit::Degree)
    }
}

/// An angle in degrees.
#[derive(Debug, Clone, Copy)]
pub struct AngleValue(qtty::Degrees);

impl AngleValue {
    pub fn from_degrees(degrees: f64) -> Self {
        Self(qtty::Degrees::new(degrees))
    }

    pub fn from_hours(hours: f64) -> Self {
        Self(Unit::Hour.to_degrees(hours))
    }

    /// Parse an angle string.
    ///
    /// Accepted forms:
    /// - bare decimal, read as degrees: `"10"`, `"-33.5"`
    /// - decimal with unit: `"2d"`, `"10.5deg"`, `"1h"`, `"0.5 rad"`, `"30arcmin"`
    /// - compound sexagesimal: `"1h2m3s"`, `"-10d20m30.5s"`, `"12°30'15\""`
    /// - colon sexagesimal with a unit: `"12:30:00 h"`, `"-33:52:00deg"`
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ParseError::angle(input, "empty string"));
        }
        if let Ok(value) = text.parse::<f64>() {
            if !value.is_finite() {
                return Err(ParseError::angle(input, "not a finite number"));
            }
            return Ok(Self::from_degrees(value));
        }

        let (negative, body) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let magnitude = if body.contains(':') {
            parse_colon_form(input, body)?
        } else {
            parse_unit_form(input, body)?
        };
        let degrees = if negative { -magnitude.value() } else { magnitude.value() };
        Ok(Self::from_degrees(degrees))
    }

    pub fn degrees(&self) -> f64 {
        self.0.value()
    }

    pub fn as_quantity(&self) -> qtty::Degrees {
        self.0
    }

    pub fn hours(&self) -> f64 {
        self.0.to::<qtty::HourAngle>().value()
    }

    pub fn radians(&self) -> f64 {
        self.0.to::<qtty::Radian>().value()
    }

    /// `[-]DD:MM:SS.sss` (or hours), with `precision` fractional second digits.
    pub fn to_sexagesimal(&self, unit: SexagesimalUnit, precision: usize) -> String {
        let value = match unit {
            SexagesimalUnit::Hours => self.hours(),
            SexagesimalUnit::Degrees => self.degrees(),
        };
        let sign = if value < 0.0 { "-" } else { "" };
        let scale = 10u64.pow(precision as u32);
        let units = (value.abs() * 3600.0 * scale as f64).round() as u64;
        let whole_seconds = units / scale;
        let fraction = units % scale;
        let seconds = whole_seconds % 60;
        let minutes = (whole_seconds / 60) % 60;
        let major = whole_seconds / 3600;
        if precision == 0 {
            format!("{}{:02}:{:02}:{:02}", sign, major, minutes, seconds)
        } else {
            format!(
                "{}{:02}:{:02}:{:02}.{:0width$}",
                sign,
                major,
                minutes,
                seconds,
                fraction,
                width = precision
            )
        }
    }
}

/// `12:30:15.5 h` style input; the unit is mandatory.
fn parse_colon_form(input: &str, body: &str) -> Result<qtty::Degrees, ParseError> {
    let split = body
        .find(|c: char| c.is_alphabetic() || c == '°')
        .ok_or_else(|| ParseError::angle(input, "colon-separated angle needs a unit (h or deg)"))?;
    let (digits, symbol) = body.split_at(split);
    let unit = Unit::lookup(symbol.trim())
        .filter(|unit| unit.is_sexagesimal())
        .ok_or_else(|| ParseError::angle(input, format!("unsupported unit '{}'", symbol.trim())))?;

    let parts: Vec<&str> = digits.trim().split(':').collect();
    if parts.len() > 3 {
        return Err(ParseError::angle(input, "too many ':'-separated fields"));
    }
    let mut total = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| ParseError::angle(input, format!("'{}' is not a number", part)))?;
        if value < 0.0 || (i > 0 && value >= 60.0) {
            return Err(ParseError::angle(input, format!("field '{}' out of range", part)));
        }
        total += value / 60f64.powi(i as i32);
    }
    Ok(unit.to_degrees(total))
}

/// `2d`, `1h2m3s`, `12°30'15"`, `0.5 rad`.
fn parse_unit_form(input: &str, body: &str) -> Result<qtty::Degrees, ParseError> {
    let tokens = tokenize(input, body)?;
    if tokens.is_empty() {
        return Err(ParseError::angle(input, "no value"));
    }
    if tokens.len() == 1 {
        let (value, ref symbol) = tokens[0];
        let unit = Unit::lookup(symbol)
            .ok_or_else(|| ParseError::angle(input, format!("unknown unit '{}'", symbol)))?;
        return Ok(unit.to_degrees(value));
    }

    let (major_value, ref major_symbol) = tokens[0];
    let major = Unit::lookup(major_symbol)
        .filter(|unit| unit.is_sexagesimal())
        .ok_or_else(|| ParseError::angle(input, "compound angle must start with h or d"))?;
    if tokens.len() > 3 {
        return Err(ParseError::angle(input, "too many components"));
    }

    let mut total = major_value;
    let mut last_rank = 0;
    for (value, symbol) in &tokens[1..] {
        let rank = match (major, symbol.as_str()) {
            (_, "m") | (Unit::Degree, "'") | (Unit::Degree, "arcmin") => 1,
            (_, "s") | (Unit::Degree, "\"") | (Unit::Degree, "arcsec") => 2,
            _ => {
                return Err(ParseError::angle(
                    input,
                    format!("unexpected component unit '{}'", symbol),
                ))
            }
        };
        if rank <= last_rank || *value >= 60.0 {
            return Err(ParseError::angle(input, "malformed sexagesimal components"));
        }
        last_rank = rank;
        total += value / 60f64.powi(rank);
    }
    Ok(major.to_degrees(total))
}

/// Split `1h2m3.5s` into `[(1, "h"), (2, "m"), (3.5, "s")]`.
fn tokenize(input: &str, body: &str) -> Result<Vec<(f64, String)>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(ParseError::angle(input, "expected a number"));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| ParseError::angle(input, format!("'{}' is not a number", number)))?;

        let tail = tail.trim_start();
        let symbol_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.' || c.is_whitespace())
            .unwrap_or(tail.len());
        if symbol_len == 0 {
            return Err(ParseError::angle(input, format!("'{}' has no unit", number)));
        }
        let (symbol, tail) = tail.split_at(symbol_len);
        tokens.push((value, symbol.to_lowercase()));
        rest = tail.trim_start();
    }
    Ok(tokens)
}

impl PartialEq for AngleValue {
    fn eq(&self, other: &Self) -> bool {
        self.degrees() == other.degrees()
    }
}

impl PartialOrd for AngleValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.degrees().partial_cmp(&other.degrees())
    }
}

impl From<f64> for AngleValue {
    fn from(degrees: f64) -> Self {
        Self::from_degrees(degrees)
    }
}

impl From<qtty::Degrees> for AngleValue {
    fn from(degrees: qtty::Degrees) -> Self {
        Self(degrees)
    }
}

impl From<qtty::HourAngles> for AngleValue {
    fn from(hours: qtty::HourAngles) -> Self {
        Self(hours.to::<qtty::Degree>())
    }
}

impl From<qtty::Radians> for AngleValue {
    fn from(radians: qtty::Radians) -> Self {
        Self(radians.to::<qtty::Degree>())
    }
}

impl FromStr for AngleValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for AngleValue {
    type Error = ParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl fmt::Display for AngleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

impl Serialize for AngleValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AngleValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AngleVisitor;

        impl serde::de::Visitor<'_> for AngleVisitor {
            type Value = AngleValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an angle string or a number of degrees")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<AngleValue, E> {
                AngleValue::parse(v).map_err(E::custom)
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<AngleValue, E> {
                Ok(AngleValue::from_degrees(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<AngleValue, E> {
                Ok(AngleValue::from_degrees(v as f64))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<AngleValue, E> {
                Ok(AngleValue::from_degrees(v as f64))
            }
        }

        deserializer.deserialize_any(AngleVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deg(text: &str) -> f64 {
        AngleValue::parse(text).unwrap().degrees()
    }

    #[test]
    fn test_float_serializes_without_suffix() {
        assert_eq!(AngleValue::from(10.0).to_string(), "10");
        assert_eq!(AngleValue::from(202.469).to_string(), "202.469");
        assert_eq!(serde_json::to_string(&AngleValue::from(20.0)).unwrap(), "\"20\"");
    }

    #[test]
    fn test_unit_suffixes() {
        assert_eq!(deg("1h"), 15.0);
        assert_eq!(deg("2d"), 2.0);
        assert_eq!(deg("10.5deg"), 10.5);
        assert_eq!(deg("10.5 deg"), 10.5);
        assert_eq!(deg("45°"), 45.0);
        assert!((deg("1rad") - 57.29577951308232).abs() < 1e-12);
        assert!((deg("30arcmin") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_compound_sexagesimal() {
        assert_eq!(deg("12h30m"), 187.5);
        assert_eq!(deg("-10d30m"), -10.5);
        assert!((deg("1h2m3s") - 15.0 * (1.0 + 2.0 / 60.0 + 3.0 / 3600.0)).abs() < 1e-12);
        assert_eq!(deg("12°30'"), 12.5);
        assert!((deg("12°30'36\"") - 12.51).abs() < 1e-12);
    }

    #[test]
    fn test_colon_sexagesimal() {
        assert_eq!(deg("12:30:00 h"), 187.5);
        assert!((deg("-33:52:30deg") + (33.0 + 52.5 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "-", "abc", "12:30:00", "10 parsecs", "1h2h", "nan", "12d70m", "1s2m"] {
            assert!(AngleValue::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_hours_accessor() {
        let angle = AngleValue::from_degrees(187.5);
        assert!((angle.hours() - 12.5).abs() < 1e-12);
        assert_eq!(AngleValue::from_hours(1.0).degrees(), 15.0);
    }

    #[test]
    fn test_sexagesimal_output() {
        let angle = AngleValue::from_degrees(24.5);
        assert_eq!(angle.to_sexagesimal(SexagesimalUnit::Degrees, 3), "24:30:00.000");
        assert_eq!(angle.to_sexagesimal(SexagesimalUnit::Hours, 3), "01:38:00.000");
        let south = AngleValue::from_degrees(-4.72);
        assert_eq!(south.to_sexagesimal(SexagesimalUnit::Degrees, 1), "-04:43:12.0");
    }

    #[test]
    fn test_deserialize_string_or_number() {
        let from_str: AngleValue = serde_json::from_str("\"1h\"").unwrap();
        let from_num: AngleValue = serde_json::from_str("15").unwrap();
        assert_eq!(from_str, from_num);
    }
}

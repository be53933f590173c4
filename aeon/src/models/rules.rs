//! Field rules shared by the validated models.
//!
//! Each rule returns a path-less [`ValidationError`]; the caller attaches the
//! field name.

use crate::error::{ErrorKind, ModelResult, ValidationError};

fn finite(value: f64) -> ModelResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new(ErrorKind::NotFinite))
    }
}

/// `value > limit`
pub fn gt(value: f64, limit: f64) -> ModelResult<()> {
    finite(value)?;
    if value > limit {
        Ok(())
    } else {
        Err(ValidationError::new(ErrorKind::GreaterThan { limit }))
    }
}

/// `value >= limit`
pub fn ge(value: f64, limit: f64) -> ModelResult<()> {
    finite(value)?;
    if value >= limit {
        Ok(())
    } else {
        Err(ValidationError::new(ErrorKind::GreaterThanEqual { limit }))
    }
}

/// `value < limit`
pub fn lt(value: f64, limit: f64) -> ModelResult<()> {
    finite(value)?;
    if value < limit {
        Ok(())
    } else {
        Err(ValidationError::new(ErrorKind::LessThan { limit }))
    }
}

/// `value <= limit`
pub fn le(value: f64, limit: f64) -> ModelResult<()> {
    finite(value)?;
    if value <= limit {
        Ok(())
    } else {
        Err(ValidationError::new(ErrorKind::LessThanEqual { limit }))
    }
}

/// Closed interval `[lo, hi]`.
pub fn within(value: f64, lo: f64, hi: f64) -> ModelResult<()> {
    ge(value, lo)?;
    le(value, hi)
}

/// Magnitude bound, `|value| <= limit`.
pub fn magnitude(value: f64, limit: f64) -> ModelResult<()> {
    ge(value, -limit)?;
    le(value, limit)
}

pub fn max_len(value: &str, max: usize) -> ModelResult<()> {
    let actual = value.chars().count();
    if actual <= max {
        Ok(())
    } else {
        Err(ValidationError::new(ErrorKind::StringTooLong { max, actual }))
    }
}

pub fn min_items<T>(items: &[T], min: usize) -> ModelResult<()> {
    if items.len() >= min {
        Ok(())
    } else {
        Err(ValidationError::new(ErrorKind::TooShort { min }))
    }
}

/// Apply `rule` when the value is present.
pub fn optional<T>(value: &Option<T>, rule: impl Fn(&T) -> ModelResult<()>) -> ModelResult<()> {
    match value {
        Some(inner) => rule(inner),
        None => Ok(()),
    }
}

/// Run `rule` on every item, tagging failures with the item index.
pub fn each<T>(items: &[T], rule: impl Fn(&T) -> ModelResult<()>) -> ModelResult<()> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(i, item)| rule(item).map_err(|err| err.in_index(i)))
}

/// `low < high`, reported against the `high` field.
pub fn ordered<T: PartialOrd + std::fmt::Debug>(
    low_name: &str,
    low: T,
    high_name: &str,
    high: T,
) -> ModelResult<()> {
    if low < high {
        Ok(())
    } else {
        Err(ValidationError::at(
            high_name,
            ErrorKind::InvalidOrder(format!(
                "{} ({:?}) must be after {} ({:?})",
                high_name, high, low_name, low
            )),
        ))
    }
}

/// Look `value` up in a closed set, returning the table's own `'static` entry.
pub fn member(value: &str, allowed: &[&'static str]) -> ModelResult<&'static str> {
    allowed
        .iter()
        .copied()
        .find(|candidate| *candidate == value)
        .ok_or_else(|| ValidationError::not_allowed(value, allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(gt(0.1, 0.0).is_ok());
        assert_eq!(gt(0.0, 0.0).unwrap_err().code(), "greater_than");
        assert_eq!(ge(-1.0, 0.0).unwrap_err().code(), "greater_than_equal");
        assert_eq!(lt(360.0, 360.0).unwrap_err().code(), "less_than");
        assert_eq!(le(200.0, 100.0).unwrap_err().code(), "less_than_equal");
        assert!(within(90.0, -90.0, 90.0).is_ok());
    }

    #[test]
    fn test_nan_is_rejected() {
        assert_eq!(ge(f64::NAN, 0.0).unwrap_err().code(), "not_finite");
        assert_eq!(le(f64::INFINITY, 1.0).unwrap_err().code(), "not_finite");
    }

    #[test]
    fn test_max_len_counts_chars() {
        assert!(max_len("ééé", 3).is_ok());
        assert_eq!(max_len("abcd", 3).unwrap_err().code(), "string_too_long");
    }

    #[test]
    fn test_each_tags_index() {
        let err = each(&[1.0, -1.0], |v| ge(*v, 0.0)).unwrap_err();
        assert_eq!(err.path().to_string(), "[1]");
    }

    #[test]
    fn test_member_returns_static_entry() {
        const MODES: &[&str] = &["full_frame", "central_2k_2x2"];
        let owned = String::from("full_frame");
        assert_eq!(member(&owned, MODES).unwrap(), "full_frame");
        assert_eq!(member("bogus", MODES).unwrap_err().code(), "literal_error");
    }
}

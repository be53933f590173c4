use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelResult, ValidationError};
use crate::models::rules;

const DEFAULT_MAX_AIRMASS: f64 = 1.6;
const DEFAULT_MAX_LUNAR_DISTANCE: f64 = 30.0;
const DEFAULT_MAX_LUNAR_PHASE: f64 = 1.0;

/// Observing conditions the scheduler must respect.
///
/// Values are carried to the remote scheduler unchanged; nothing here
/// evaluates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConstraints")]
pub struct Constraints {
    max_airmass: f64,
    /// Lunar distance limit, degrees.
    max_lunar_distance: f64,
    max_lunar_phase: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_seeing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_transparency: Option<f64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    extra_params: Map<String, Value>,
}

crate::validated_fields! {
    Constraints {
        /// `(0, 25]`
        max_airmass / set_max_airmass: f64 = |v| {
            rules::gt(*v, 0.0)?;
            rules::le(*v, 25.0)
        };
        /// `[0, 180]` degrees
        max_lunar_distance / set_max_lunar_distance: f64 = |v| rules::within(*v, 0.0, 180.0);
        /// `(0, 1]`
        max_lunar_phase / set_max_lunar_phase: f64 = |v| {
            rules::gt(*v, 0.0)?;
            rules::le(*v, 1.0)
        };
        /// Arcseconds, `>= 0`.
        max_seeing / set_max_seeing: Option<f64> = |v| rules::optional(v, |s| rules::ge(*s, 0.0));
        min_transparency / set_min_transparency: Option<f64> = |v| rules::optional(v, |t| rules::within(*t, f64::MIN, f64::MAX));
        /// Fields the model does not cover yet, passed through verbatim.
        extra_params / set_extra_params: Map<String, Value> = |_| Ok(());
    }
}

impl Constraints {
    pub fn new(max_airmass: f64, max_lunar_distance: f64, max_lunar_phase: f64) -> ModelResult<Self> {
        let constraints = Self {
            max_airmass,
            max_lunar_distance,
            max_lunar_phase,
            max_seeing: None,
            min_transparency: None,
            extra_params: Map::new(),
        };
        constraints.validate_fields()?;
        Ok(constraints)
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_airmass: DEFAULT_MAX_AIRMASS,
            max_lunar_distance: DEFAULT_MAX_LUNAR_DISTANCE,
            max_lunar_phase: DEFAULT_MAX_LUNAR_PHASE,
            max_seeing: None,
            min_transparency: None,
            extra_params: Map::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawConstraints {
    #[serde(default)]
    max_airmass: Option<f64>,
    #[serde(default)]
    max_lunar_distance: Option<f64>,
    #[serde(default)]
    max_lunar_phase: Option<f64>,
    #[serde(default)]
    max_seeing: Option<f64>,
    #[serde(default)]
    min_transparency: Option<f64>,
    #[serde(default)]
    extra_params: Option<Map<String, Value>>,
}

impl TryFrom<RawConstraints> for Constraints {
    type Error = ValidationError;

    fn try_from(raw: RawConstraints) -> Result<Self, Self::Error> {
        let constraints = Self {
            max_airmass: raw.max_airmass.unwrap_or(DEFAULT_MAX_AIRMASS),
            max_lunar_distance: raw.max_lunar_distance.unwrap_or(DEFAULT_MAX_LUNAR_DISTANCE),
            max_lunar_phase: raw.max_lunar_phase.unwrap_or(DEFAULT_MAX_LUNAR_PHASE),
            max_seeing: raw.max_seeing,
            min_transparency: raw.min_transparency,
            extra_params: raw.extra_params.unwrap_or_default(),
        };
        constraints.validate_fields()?;
        Ok(constraints)
    }
}

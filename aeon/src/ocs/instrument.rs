//! Instrument-parameterised configuration types.
//!
//! Every physical instrument is a zero-sized marker type implementing
//! [`Instrument`], whose [`InstrumentSpec`] lists the legal values for each
//! instrument-specific field. The configuration types are generic over that
//! marker, so `InstrumentConfig<Lco1M0ScicamSinistro>` only ever holds a
//! Sinistro readout mode and Sinistro filter.
//!
//! ```ignore
//! use aeon::ocs::lco::Lco1M0ScicamSinistro as Sinistro;
//! use aeon::ocs::Instrument;
//!
//! let block = Sinistro::instrument_config(
//!     1,
//!     10.0,
//!     "central_2k_2x2",
//!     None,
//!     Sinistro::optical_elements(&[("filter", "B")])?,
//! )?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, ModelResult, ValidationError};
use crate::models::rules;
use crate::models::target::Target;
use crate::ocs::constraints::Constraints;

crate::string_enum! {
    /// Observation type of a configuration.
    pub enum ConfigurationType {
        Expose => "EXPOSE",
        RepeatExpose => "REPEAT_EXPOSE",
        SkyFlat => "SKY_FLAT",
        Standard => "STANDARD",
        Arc => "ARC",
        LampFlat => "LAMP_FLAT",
        Spectrum => "SPECTRUM",
        RepeatSpectrum => "REPEAT_SPECTRUM",
        AutoFocus => "AUTO_FOCUS",
        Triple => "TRIPLE",
        NresTest => "NRES_TEST",
        NresSpectrum => "NRES_SPECTRUM",
        RepeatNresSpectrum => "REPEAT_NRES_SPECTRUM",
        NresExpose => "NRES_EXPOSE",
        NresDark => "NRES_DARK",
        NresBias => "NRES_BIAS",
        Engineering => "ENGINEERING",
        Script => "SCRIPT",
        Bias => "BIAS",
        Dark => "DARK",
    }
}

/// One selectable optical element and its legal positions.
#[derive(Debug, PartialEq, Eq)]
pub struct OpticalElementSpec {
    pub name: &'static str,
    pub values: &'static [&'static str],
}

/// Capabilities of one instrument.
#[derive(Debug, PartialEq, Eq)]
pub struct InstrumentSpec {
    /// Discriminator value, e.g. `1M0-SCICAM-SINISTRO`.
    pub instrument_type: &'static str,
    /// Name of the marker type.
    pub type_name: &'static str,
    pub configuration_types: &'static [ConfigurationType],
    pub readout_modes: &'static [&'static str],
    /// Empty when the instrument has no selectable rotator mode.
    pub rotator_modes: &'static [&'static str],
    pub optical_elements: &'static [OpticalElementSpec],
    pub acquisition_modes: &'static [&'static str],
    pub guiding_modes: &'static [&'static str],
}

impl InstrumentSpec {
    pub fn supports(&self, kind: ConfigurationType) -> bool {
        self.configuration_types.contains(&kind)
    }

    pub fn optical_element(&self, name: &str) -> Option<&'static OpticalElementSpec> {
        let elements: &'static [OpticalElementSpec] = self.optical_elements;
        elements.iter().find(|element| element.name == name)
    }

    pub fn requires_rotator_mode(&self) -> bool {
        !self.rotator_modes.is_empty()
    }
}

/// A physical instrument, identified by a marker type.
///
/// The provided functions build the instrument's sub-objects, so calling code
/// only needs the type (or a generic parameter bound by this trait).
pub trait Instrument: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    const SPEC: &'static InstrumentSpec;

    fn configuration(
        kind: ConfigurationType,
        target: impl Into<Target>,
        constraints: Constraints,
        instrument_configs: Vec<InstrumentConfig<Self>>,
        acquisition_config: AcquisitionConfig<Self>,
        guiding_config: GuidingConfig<Self>,
    ) -> ModelResult<InstrumentConfiguration<Self>> {
        InstrumentConfiguration::new(
            kind,
            target,
            constraints,
            instrument_configs,
            acquisition_config,
            guiding_config,
        )
    }

    fn instrument_config(
        exposure_count: u32,
        exposure_time: f64,
        mode: &str,
        rotator_mode: Option<&str>,
        optical_elements: OpticalElements<Self>,
    ) -> ModelResult<InstrumentConfig<Self>> {
        InstrumentConfig::new(exposure_count, exposure_time, mode, rotator_mode, optical_elements)
    }

    fn optical_elements(pairs: &[(&str, &str)]) -> ModelResult<OpticalElements<Self>> {
        OpticalElements::new(pairs)
    }

    fn acquisition_config(mode: &str) -> ModelResult<AcquisitionConfig<Self>> {
        AcquisitionConfig::new(mode)
    }

    fn guiding_config(mode: &str, optional: bool) -> ModelResult<GuidingConfig<Self>> {
        GuidingConfig::new(mode, optional)
    }
}

// =========================================================================
// Region of interest
// =========================================================================

/// Detector sub-region in pixels. When both ends of an axis are set the
/// lower bound must be smaller than the upper one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRoi")]
pub struct Roi {
    #[serde(skip_serializing_if = "Option::is_none")]
    x1: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x2: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y1: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y2: Option<u32>,
}

crate::validated_fields! {
    Roi {
        x1 / set_x1: Option<u32> = |_| Ok(());
        x2 / set_x2: Option<u32> = |_| Ok(());
        y1 / set_y1: Option<u32> = |_| Ok(());
        y2 / set_y2: Option<u32> = |_| Ok(());
    } cross Roi::check_order
}

impl Roi {
    pub fn new(x1: Option<u32>, x2: Option<u32>, y1: Option<u32>, y2: Option<u32>) -> ModelResult<Self> {
        let roi = Self { x1, x2, y1, y2 };
        roi.validate_fields()?;
        Ok(roi)
    }

    fn check_order(&self) -> ModelResult<()> {
        if let (Some(x1), Some(x2)) = (self.x1, self.x2) {
            rules::ordered("x1", x1, "x2", x2)?;
        }
        if let (Some(y1), Some(y2)) = (self.y1, self.y2) {
            rules::ordered("y1", y1, "y2", y2)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawRoi {
    #[serde(default)]
    x1: Option<u32>,
    #[serde(default)]
    x2: Option<u32>,
    #[serde(default)]
    y1: Option<u32>,
    #[serde(default)]
    y2: Option<u32>,
}

impl TryFrom<RawRoi> for Roi {
    type Error = ValidationError;

    fn try_from(raw: RawRoi) -> Result<Self, Self::Error> {
        Roi::new(raw.x1, raw.x2, raw.y1, raw.y2)
    }
}

// =========================================================================
// Optical elements
// =========================================================================

/// Optical element selection. Every element the instrument declares must be
/// set; undeclared elements are rejected.
pub struct OpticalElements<I> {
    values: BTreeMap<&'static str, &'static str>,
    instrument: PhantomData<I>,
}

impl<I: Instrument> OpticalElements<I> {
    pub fn new(pairs: &[(&str, &str)]) -> ModelResult<Self> {
        let mut elements = Self {
            values: BTreeMap::new(),
            instrument: PhantomData,
        };
        for (name, value) in pairs {
            let (name, value) = Self::resolve(name, value)?;
            elements.values.insert(name, value);
        }
        if let Some(missing) = I::SPEC
            .optical_elements
            .iter()
            .find(|element| !elements.values.contains_key(element.name))
        {
            return Err(ValidationError::missing(missing.name));
        }
        Ok(elements)
    }

    /// The selection for instruments without optical elements.
    pub fn none() -> ModelResult<Self> {
        Self::new(&[])
    }

    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.values.get(name).copied()
    }

    /// Change one element's position.
    pub fn set(&mut self, name: &str, value: &str) -> ModelResult<()> {
        let (name, value) = Self::resolve(name, value)?;
        self.values.insert(name, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    fn resolve(name: &str, value: &str) -> ModelResult<(&'static str, &'static str)> {
        let element = I::SPEC.optical_element(name).ok_or_else(|| {
            ValidationError::not_permitted(format!(
                "{} has no optical element '{}'",
                I::SPEC.instrument_type,
                name
            ))
            .in_field(name)
        })?;
        let value = rules::member(value, element.values).map_err(|err| err.in_field(element.name))?;
        Ok((element.name, value))
    }
}

impl<I> Clone for OpticalElements<I> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            instrument: PhantomData,
        }
    }
}

impl<I> fmt::Debug for OpticalElements<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

impl<I> PartialEq for OpticalElements<I> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<I> Serialize for OpticalElements<I> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl<'de, I: Instrument> Deserialize<'de> for OpticalElements<I> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let pairs: Vec<(&str, &str)> = raw.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        OpticalElements::new(&pairs).map_err(serde::de::Error::custom)
    }
}

// =========================================================================
// Exposure blocks
// =========================================================================

/// One block of identical exposures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct InstrumentConfig<I> {
    exposure_count: u32,
    /// Seconds.
    exposure_time: f64,
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rotator_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rois: Vec<Roi>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    extra_params: Map<String, Value>,
    optical_elements: OpticalElements<I>,
}

impl<I: Instrument> InstrumentConfig<I> {
    pub fn new(
        exposure_count: u32,
        exposure_time: f64,
        mode: &str,
        rotator_mode: Option<&str>,
        optical_elements: OpticalElements<I>,
    ) -> ModelResult<Self> {
        let mut config = Self {
            exposure_count: 1,
            exposure_time: 0.0,
            mode: "",
            rotator_mode: None,
            rois: Vec::new(),
            extra_params: Map::new(),
            optical_elements,
        };
        config.set_exposure_count(exposure_count)?;
        config.set_exposure_time(exposure_time)?;
        config.mode = Self::check_mode(mode)?;
        config.rotator_mode = Self::check_rotator_mode(rotator_mode)?;
        Ok(config)
    }

    fn check_mode(mode: &str) -> ModelResult<&'static str> {
        rules::member(mode, I::SPEC.readout_modes).map_err(|err| err.in_field("mode"))
    }

    fn check_rotator_mode(mode: Option<&str>) -> ModelResult<Option<&'static str>> {
        let spec = I::SPEC;
        match mode {
            Some(mode) if spec.requires_rotator_mode() => rules::member(mode, spec.rotator_modes)
                .map(Some)
                .map_err(|err| err.in_field("rotator_mode")),
            Some(_) => Err(ValidationError::not_permitted(format!(
                "{} has no rotator",
                spec.instrument_type
            ))
            .in_field("rotator_mode")),
            None if spec.requires_rotator_mode() => Err(ValidationError::missing("rotator_mode")),
            None => Ok(None),
        }
    }

    pub fn exposure_count(&self) -> u32 {
        self.exposure_count
    }

    pub fn set_exposure_count(&mut self, count: u32) -> ModelResult<()> {
        rules::ge(f64::from(count), 1.0).map_err(|err| err.in_field("exposure_count"))?;
        self.exposure_count = count;
        Ok(())
    }

    pub fn exposure_time(&self) -> f64 {
        self.exposure_time
    }

    pub fn set_exposure_time(&mut self, seconds: f64) -> ModelResult<()> {
        rules::ge(seconds, 0.0).map_err(|err| err.in_field("exposure_time"))?;
        self.exposure_time = seconds;
        Ok(())
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }

    pub fn set_mode(&mut self, mode: &str) -> ModelResult<()> {
        self.mode = Self::check_mode(mode)?;
        Ok(())
    }

    pub fn rotator_mode(&self) -> Option<&'static str> {
        self.rotator_mode
    }

    pub fn set_rotator_mode(&mut self, mode: Option<&str>) -> ModelResult<()> {
        self.rotator_mode = Self::check_rotator_mode(mode)?;
        Ok(())
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    pub fn set_rois(&mut self, rois: Vec<Roi>) {
        self.rois = rois;
    }

    pub fn extra_params(&self) -> &Map<String, Value> {
        &self.extra_params
    }

    pub fn set_extra_params(&mut self, extra_params: Map<String, Value>) {
        self.extra_params = extra_params;
    }

    pub fn optical_elements(&self) -> &OpticalElements<I> {
        &self.optical_elements
    }

    pub fn optical_elements_mut(&mut self) -> &mut OpticalElements<I> {
        &mut self.optical_elements
    }
}

#[derive(Deserialize)]
struct RawInstrumentConfig {
    exposure_count: u32,
    exposure_time: f64,
    mode: String,
    #[serde(default)]
    rotator_mode: Option<String>,
    #[serde(default)]
    rois: Option<Vec<Roi>>,
    #[serde(default)]
    extra_params: Option<Map<String, Value>>,
    #[serde(default)]
    optical_elements: Option<BTreeMap<String, String>>,
}

// The `&'static str` fields come from the instrument table, so the raw form
// owns its strings and `try_from` resolves them.
impl<'de, I: Instrument> Deserialize<'de> for InstrumentConfig<I> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawInstrumentConfig::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl<I: Instrument> TryFrom<RawInstrumentConfig> for InstrumentConfig<I> {
    type Error = ValidationError;

    fn try_from(raw: RawInstrumentConfig) -> Result<Self, Self::Error> {
        let pairs: Vec<(&str, &str)> = raw
            .optical_elements
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let optical_elements =
            OpticalElements::new(&pairs).map_err(|err| err.in_field("optical_elements"))?;
        let mut config = InstrumentConfig::new(
            raw.exposure_count,
            raw.exposure_time,
            &raw.mode,
            // Observatory echoes report an absent rotator as "".
            raw.rotator_mode.as_deref().filter(|mode| !mode.is_empty()),
            optical_elements,
        )?;
        config.rois = raw.rois.unwrap_or_default();
        config.extra_params = raw.extra_params.unwrap_or_default();
        Ok(config)
    }
}

// =========================================================================
// Acquisition and guiding
// =========================================================================

const ACQUISITION_EXPOSURE_MAX: f64 = 60.0;
const GUIDING_EXPOSURE_MAX: f64 = 120.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct AcquisitionConfig<I> {
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exposure_time: Option<f64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    extra_params: Map<String, Value>,
    #[serde(skip)]
    instrument: PhantomData<I>,
}

impl<I: Instrument> AcquisitionConfig<I> {
    pub fn new(mode: &str) -> ModelResult<Self> {
        Ok(Self {
            mode: Self::check_mode(mode)?,
            exposure_time: None,
            extra_params: Map::new(),
            instrument: PhantomData,
        })
    }

    fn check_mode(mode: &str) -> ModelResult<&'static str> {
        rules::member(mode, I::SPEC.acquisition_modes).map_err(|err| err.in_field("mode"))
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }

    pub fn set_mode(&mut self, mode: &str) -> ModelResult<()> {
        self.mode = Self::check_mode(mode)?;
        Ok(())
    }

    pub fn exposure_time(&self) -> Option<f64> {
        self.exposure_time
    }

    /// Seconds, `[0, 60]`.
    pub fn set_exposure_time(&mut self, seconds: Option<f64>) -> ModelResult<()> {
        rules::optional(&seconds, |s| rules::within(*s, 0.0, ACQUISITION_EXPOSURE_MAX))
            .map_err(|err| err.in_field("exposure_time"))?;
        self.exposure_time = seconds;
        Ok(())
    }

    pub fn extra_params(&self) -> &Map<String, Value> {
        &self.extra_params
    }

    pub fn set_extra_params(&mut self, extra_params: Map<String, Value>) {
        self.extra_params = extra_params;
    }
}

#[derive(Deserialize)]
struct RawAcquisitionConfig {
    mode: String,
    #[serde(default)]
    exposure_time: Option<f64>,
    #[serde(default)]
    extra_params: Option<Map<String, Value>>,
}

impl<'de, I: Instrument> Deserialize<'de> for AcquisitionConfig<I> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAcquisitionConfig::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl<I: Instrument> TryFrom<RawAcquisitionConfig> for AcquisitionConfig<I> {
    type Error = ValidationError;

    fn try_from(raw: RawAcquisitionConfig) -> Result<Self, Self::Error> {
        let mut config = AcquisitionConfig::new(&raw.mode)?;
        config.set_exposure_time(raw.exposure_time)?;
        config.extra_params = raw.extra_params.unwrap_or_default();
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct GuidingConfig<I> {
    mode: &'static str,
    /// Whether the observation may proceed without a guide star.
    optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    exposure_time: Option<f64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    extra_params: Map<String, Value>,
    #[serde(skip)]
    instrument: PhantomData<I>,
}

impl<I: Instrument> GuidingConfig<I> {
    pub fn new(mode: &str, optional: bool) -> ModelResult<Self> {
        Ok(Self {
            mode: Self::check_mode(mode)?,
            optional,
            exposure_time: None,
            extra_params: Map::new(),
            instrument: PhantomData,
        })
    }

    fn check_mode(mode: &str) -> ModelResult<&'static str> {
        rules::member(mode, I::SPEC.guiding_modes).map_err(|err| err.in_field("mode"))
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }

    pub fn set_mode(&mut self, mode: &str) -> ModelResult<()> {
        self.mode = Self::check_mode(mode)?;
        Ok(())
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn set_optional(&mut self, optional: bool) {
        self.optional = optional;
    }

    pub fn exposure_time(&self) -> Option<f64> {
        self.exposure_time
    }

    /// Seconds, `[0, 120]`.
    pub fn set_exposure_time(&mut self, seconds: Option<f64>) -> ModelResult<()> {
        rules::optional(&seconds, |s| rules::within(*s, 0.0, GUIDING_EXPOSURE_MAX))
            .map_err(|err| err.in_field("exposure_time"))?;
        self.exposure_time = seconds;
        Ok(())
    }

    pub fn extra_params(&self) -> &Map<String, Value> {
        &self.extra_params
    }

    pub fn set_extra_params(&mut self, extra_params: Map<String, Value>) {
        self.extra_params = extra_params;
    }
}

#[derive(Deserialize)]
struct RawGuidingConfig {
    mode: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    exposure_time: Option<f64>,
    #[serde(default)]
    extra_params: Option<Map<String, Value>>,
}

impl<'de, I: Instrument> Deserialize<'de> for GuidingConfig<I> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawGuidingConfig::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl<I: Instrument> TryFrom<RawGuidingConfig> for GuidingConfig<I> {
    type Error = ValidationError;

    fn try_from(raw: RawGuidingConfig) -> Result<Self, Self::Error> {
        let mut config = GuidingConfig::new(&raw.mode, raw.optional)?;
        config.set_exposure_time(raw.exposure_time)?;
        config.extra_params = raw.extra_params.unwrap_or_default();
        Ok(config)
    }
}

// =========================================================================
// Configuration
// =========================================================================

/// Everything needed to operate one instrument on one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct InstrumentConfiguration<I> {
    #[serde(rename = "type")]
    kind: ConfigurationType,
    instrument_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_duration: Option<f64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    extra_params: Map<String, Value>,
    instrument_configs: Vec<InstrumentConfig<I>>,
    acquisition_config: AcquisitionConfig<I>,
    guiding_config: GuidingConfig<I>,
    target: Target,
    constraints: Constraints,
}

impl<I: Instrument> InstrumentConfiguration<I> {
    pub fn new(
        kind: ConfigurationType,
        target: impl Into<Target>,
        constraints: Constraints,
        instrument_configs: Vec<InstrumentConfig<I>>,
        acquisition_config: AcquisitionConfig<I>,
        guiding_config: GuidingConfig<I>,
    ) -> ModelResult<Self> {
        Self::check_kind(kind)?;
        Self::check_instrument_configs(&instrument_configs)?;
        Ok(Self {
            kind,
            instrument_type: I::SPEC.instrument_type,
            repeat_duration: None,
            extra_params: Map::new(),
            instrument_configs,
            acquisition_config,
            guiding_config,
            target: target.into(),
            constraints,
        })
    }

    fn check_kind(kind: ConfigurationType) -> ModelResult<()> {
        if I::SPEC.supports(kind) {
            Ok(())
        } else {
            let allowed: Vec<&str> = I::SPEC.configuration_types.iter().map(|t| t.as_str()).collect();
            Err(ValidationError::not_allowed(kind.as_str(), &allowed).in_field("type"))
        }
    }

    fn check_instrument_configs(configs: &[InstrumentConfig<I>]) -> ModelResult<()> {
        rules::min_items(configs, 1).map_err(|err| err.in_field("instrument_configs"))
    }

    pub fn spec(&self) -> &'static InstrumentSpec {
        I::SPEC
    }

    pub fn kind(&self) -> ConfigurationType {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ConfigurationType) -> ModelResult<()> {
        Self::check_kind(kind)?;
        self.kind = kind;
        Ok(())
    }

    pub fn instrument_type(&self) -> &'static str {
        self.instrument_type
    }

    pub fn repeat_duration(&self) -> Option<f64> {
        self.repeat_duration
    }

    /// Seconds, `>= 0`.
    pub fn set_repeat_duration(&mut self, seconds: Option<f64>) -> ModelResult<()> {
        rules::optional(&seconds, |s| rules::ge(*s, 0.0)).map_err(|err| err.in_field("repeat_duration"))?;
        self.repeat_duration = seconds;
        Ok(())
    }

    pub fn extra_params(&self) -> &Map<String, Value> {
        &self.extra_params
    }

    pub fn set_extra_params(&mut self, extra_params: Map<String, Value>) {
        self.extra_params = extra_params;
    }

    pub fn instrument_configs(&self) -> &[InstrumentConfig<I>] {
        &self.instrument_configs
    }

    pub fn instrument_config_mut(&mut self, index: usize) -> Option<&mut InstrumentConfig<I>> {
        self.instrument_configs.get_mut(index)
    }

    pub fn set_instrument_configs(&mut self, configs: Vec<InstrumentConfig<I>>) -> ModelResult<()> {
        Self::check_instrument_configs(&configs)?;
        self.instrument_configs = configs;
        Ok(())
    }

    pub fn push_instrument_config(&mut self, config: InstrumentConfig<I>) {
        self.instrument_configs.push(config);
    }

    pub fn acquisition_config(&self) -> &AcquisitionConfig<I> {
        &self.acquisition_config
    }

    pub fn acquisition_config_mut(&mut self) -> &mut AcquisitionConfig<I> {
        &mut self.acquisition_config
    }

    pub fn guiding_config(&self) -> &GuidingConfig<I> {
        &self.guiding_config
    }

    pub fn guiding_config_mut(&mut self) -> &mut GuidingConfig<I> {
        &mut self.guiding_config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }

    pub fn set_target(&mut self, target: impl Into<Target>) {
        self.target = target.into();
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut Constraints {
        &mut self.constraints
    }

    pub fn set_constraints(&mut self, constraints: Constraints) {
        self.constraints = constraints;
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "I: Instrument"))]
struct RawInstrumentConfiguration<I> {
    #[serde(rename = "type")]
    kind: ConfigurationType,
    #[serde(default)]
    instrument_type: Option<String>,
    #[serde(default)]
    repeat_duration: Option<f64>,
    #[serde(default)]
    extra_params: Option<Map<String, Value>>,
    instrument_configs: Vec<InstrumentConfig<I>>,
    acquisition_config: AcquisitionConfig<I>,
    guiding_config: GuidingConfig<I>,
    target: Target,
    constraints: Constraints,
}

impl<'de, I: Instrument> Deserialize<'de> for InstrumentConfiguration<I> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawInstrumentConfiguration::<I>::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl<I: Instrument> TryFrom<RawInstrumentConfiguration<I>> for InstrumentConfiguration<I> {
    type Error = ValidationError;

    fn try_from(raw: RawInstrumentConfiguration<I>) -> Result<Self, Self::Error> {
        if let Some(instrument_type) = raw.instrument_type {
            if instrument_type != I::SPEC.instrument_type {
                return Err(ValidationError::at(
                    "instrument_type",
                    ErrorKind::UnknownVariant {
                        value: instrument_type,
                        expected: vec![I::SPEC.instrument_type.to_string()],
                    },
                ));
            }
        }
        let mut configuration = InstrumentConfiguration::new(
            raw.kind,
            raw.target,
            raw.constraints,
            raw.instrument_configs,
            raw.acquisition_config,
            raw.guiding_config,
        )?;
        configuration.set_repeat_duration(raw.repeat_duration)?;
        configuration.extra_params = raw.extra_params.unwrap_or_default();
        Ok(configuration)
    }
}

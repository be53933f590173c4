//! # aeon
//!
//! Typed client models for telescope observation requests.
//!
//! Observation requests for the Las Cumbres Observatory (LCO) network and the
//! SOAR telescope are built from strongly typed models that validate every
//! field on construction, on assignment and on deserialization, then
//! serialize to the JSON bodies the observation portal expects.
//!
//! ## Features
//!
//! - **Scalar adapters**: instants ([`models::TimeValue`]) and angles
//!   ([`models::AngleValue`]) accepted in any common representation
//! - **Targets and windows**: sidereal and non-sidereal targets, observing windows
//! - **Instruments**: one data table describing every supported instrument,
//!   with per-instrument configuration types checked at compile time
//! - **Requests**: request groups, requests, cadences and locations
//! - **Facilities**: async clients for the LCO and SOAR portals (`facility` feature)
//! - **ESO**: the ESO Phase 2 data model
//!
//! ## Architecture
//!
//! - [`error`]: validation and parse errors with field paths
//! - [`models`]: network-independent value types
//! - [`ocs`]: observation portal (OCS) models, instrument table and clients
//! - [`payload`]: conversion between models and wire JSON
//! - [`config`]: facility settings from the environment or a TOML file
//! - [`eso`]: ESO Phase 2 models
//! - [`codegen`]: instrument table generator
//!
//! ## Example
//!
//! ```
//! use aeon::models::{SiderealTarget, TimeValue, Window};
//! use aeon::ocs::lco::Lco1M0ScicamSinistro;
//! use aeon::ocs::{Constraints, ConfigurationType, Instrument, Location, Request, RequestGroup};
//! use aeon::ocs::{ObservationType, Operator};
//!
//! let target = SiderealTarget::new("M51", 202.469, 47.195)?;
//! let configuration = Lco1M0ScicamSinistro::configuration(
//!     ConfigurationType::Expose,
//!     target,
//!     Constraints::default(),
//!     vec![Lco1M0ScicamSinistro::instrument_config(
//!         1,
//!         10.0,
//!         "central_2k_2x2",
//!         None,
//!         Lco1M0ScicamSinistro::optical_elements(&[("filter", "B")])?,
//!     )?],
//!     Lco1M0ScicamSinistro::acquisition_config("OFF")?,
//!     Lco1M0ScicamSinistro::guiding_config("ON", true)?,
//! )?;
//!
//! let window = Window::new(
//!     Some(TimeValue::parse("2025-04-10T00:00:00")?),
//!     TimeValue::parse("2025-05-10T00:00:00")?,
//! )?;
//! let request = Request::new(vec![configuration.into()], vec![window], Location::telescope_class("1m0"))?;
//! let group = RequestGroup::new("M51 test", "TEST2025A-001", 1.05, Operator::Single, ObservationType::Normal)?
//!     .with_request(request);
//!
//! let payload = aeon::payload::to_payload(&group, &aeon::payload::OutputMapping::lco())?;
//! assert_eq!(
//!     payload["requests"][0]["configurations"][0]["instrument_type"],
//!     "1M0-SCICAM-SINISTRO"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod eso;
pub mod models;
pub mod ocs;
pub mod payload;

pub use config::Settings;
pub use error::{ErrorKind, ModelResult, ParseError, ValidationError};
pub use payload::{from_json_str, from_payload, to_payload, OutputMapping, PayloadError};

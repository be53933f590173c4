//! Request groups, requests and their scheduling attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelResult, ValidationError};
use crate::models::rules;
use crate::models::time::TimeValue;
use crate::models::window::Window;
use crate::ocs::registry::Configuration;

crate::string_enum! {
    /// How the requests of a group are scheduled.
    pub enum Operator {
        Single => "SINGLE",
        Many => "MANY",
    }
}

crate::string_enum! {
    pub enum ObservationType {
        Normal => "NORMAL",
        RapidResponse => "RAPID_RESPONSE",
        TimeCritical => "TIME_CRITICAL",
        Direct => "DIRECT",
    }
}

crate::string_enum! {
    /// Scheduler preference within a window.
    pub enum OptimizationType {
        Time => "TIME",
        Airmass => "AIRMASS",
    }
}

crate::string_enum! {
    /// Lifecycle state reported by the observatory.
    pub enum RequestGroupState {
        Pending => "PENDING",
        Completed => "COMPLETED",
        WindowExpired => "WINDOW_EXPIRED",
        FailureLimitReached => "FAILURE_LIMIT_REACHED",
        Canceled => "CANCELED",
    }
}

const NAME_MAX_CHARS: usize = 50;
const NOTE_MAX_CHARS: usize = 255;
const CADENCE_MIN_HOURS: f64 = 0.02;

/// Where a request may run. Only the telescope class is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope: Option<String>,
    pub telescope_class: String,
}

impl Location {
    pub fn telescope_class(class: impl Into<String>) -> Self {
        Self {
            site: None,
            enclosure: None,
            telescope: None,
            telescope_class: class.into(),
        }
    }
}

/// Periodic repetition of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCadence")]
pub struct Cadence {
    start: TimeValue,
    end: TimeValue,
    /// Hours.
    period: f64,
    /// Hours.
    jitter: f64,
}

crate::validated_fields! {
    Cadence {
        start / set_start: TimeValue = |_| Ok(());
        end / set_end: TimeValue = |_| Ok(());
        period / set_period: f64 = |v| rules::ge(*v, CADENCE_MIN_HOURS);
        jitter / set_jitter: f64 = |v| rules::ge(*v, CADENCE_MIN_HOURS);
    } cross Cadence::check_order
}

impl Cadence {
    pub fn new(
        start: impl Into<TimeValue>,
        end: impl Into<TimeValue>,
        period: f64,
        jitter: f64,
    ) -> ModelResult<Self> {
        let cadence = Self {
            start: start.into(),
            end: end.into(),
            period,
            jitter,
        };
        cadence.validate_fields()?;
        Ok(cadence)
    }

    fn check_order(&self) -> ModelResult<()> {
        rules::ordered("start", &self.start, "end", &self.end)
    }
}

#[derive(Deserialize)]
struct RawCadence {
    start: TimeValue,
    end: TimeValue,
    period: f64,
    jitter: f64,
}

impl TryFrom<RawCadence> for Cadence {
    type Error = ValidationError;

    fn try_from(raw: RawCadence) -> Result<Self, Self::Error> {
        Cadence::new(raw.start, raw.end, raw.period, raw.jitter)
    }
}

/// A single observation: what to observe, when and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequest")]
pub struct Request {
    acceptability_threshold: f64,
    configuration_repeats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    optimization_type: Option<OptimizationType>,
    observation_note: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    extra_params: Map<String, Value>,
    configurations: Vec<Configuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cadence: Option<Cadence>,
    windows: Vec<Window>,
    location: Location,
}

crate::validated_fields! {
    Request {
        /// Percentage of the observation that must complete, `[0, 100]`.
        acceptability_threshold / set_acceptability_threshold: f64 = |v| rules::within(*v, 0.0, 100.0);
        configuration_repeats / set_configuration_repeats: u32 = |v| rules::ge(f64::from(*v), 1.0);
        optimization_type / set_optimization_type: Option<OptimizationType> = |_| Ok(());
        observation_note / set_observation_note: String = |v| rules::max_len(v, NOTE_MAX_CHARS);
        extra_params / set_extra_params: Map<String, Value> = |_| Ok(());
        configurations / set_configurations: Vec<Configuration> = |v| rules::min_items(v, 1);
        cadence / set_cadence: Option<Cadence> = |_| Ok(());
        windows / set_windows: Vec<Window> = |v| rules::min_items(v, 1);
        location / set_location: Location = |_| Ok(());
    }
}

impl Request {
    pub const DEFAULT_ACCEPTABILITY_THRESHOLD: f64 = 90.0;

    pub fn new(
        configurations: Vec<Configuration>,
        windows: Vec<Window>,
        location: Location,
    ) -> ModelResult<Self> {
        let request = Self {
            acceptability_threshold: Self::DEFAULT_ACCEPTABILITY_THRESHOLD,
            configuration_repeats: 1,
            optimization_type: None,
            observation_note: String::new(),
            extra_params: Map::new(),
            configurations,
            cadence: None,
            windows,
            location,
        };
        request.validate_fields()?;
        Ok(request)
    }

    pub fn configurations_mut(&mut self) -> &mut [Configuration] {
        &mut self.configurations
    }

    pub fn push_configuration(&mut self, configuration: impl Into<Configuration>) {
        self.configurations.push(configuration.into());
    }

    pub fn windows_mut(&mut self) -> &mut [Window] {
        &mut self.windows
    }

    pub fn push_window(&mut self, window: Window) {
        self.windows.push(window);
    }
}

#[derive(Deserialize)]
struct RawRequest {
    #[serde(default)]
    acceptability_threshold: Option<f64>,
    #[serde(default)]
    configuration_repeats: Option<u32>,
    #[serde(default)]
    optimization_type: Option<OptimizationType>,
    #[serde(default)]
    observation_note: Option<String>,
    #[serde(default)]
    extra_params: Option<Map<String, Value>>,
    #[serde(default)]
    configurations: Vec<Configuration>,
    #[serde(default)]
    cadence: Option<Cadence>,
    #[serde(default)]
    windows: Vec<Window>,
    location: Location,
}

impl TryFrom<RawRequest> for Request {
    type Error = ValidationError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let request = Self {
            acceptability_threshold: raw
                .acceptability_threshold
                .unwrap_or(Self::DEFAULT_ACCEPTABILITY_THRESHOLD),
            configuration_repeats: raw.configuration_repeats.unwrap_or(1),
            optimization_type: raw.optimization_type,
            observation_note: raw.observation_note.unwrap_or_default(),
            extra_params: raw.extra_params.unwrap_or_default(),
            configurations: raw.configurations,
            cadence: raw.cadence,
            windows: raw.windows,
            location: raw.location,
        };
        request.validate_fields()?;
        Ok(request)
    }
}

/// A set of requests submitted together under one proposal.
///
/// `MANY` is expected to carry at least two requests; that is left to the
/// caller, as is adding the first request after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequestGroup")]
pub struct RequestGroup {
    name: String,
    proposal: String,
    ipp_value: f64,
    operator: Operator,
    observation_type: ObservationType,
    requests: Vec<Request>,
}

crate::validated_fields! {
    RequestGroup {
        /// Copied into the FITS `GROUPID` header, at most 50 characters.
        name / set_name: String = |v| rules::max_len(v, NAME_MAX_CHARS);
        proposal / set_proposal: String = |_| Ok(());
        /// Priority multiplier, `>= 0`.
        ipp_value / set_ipp_value: f64 = |v| rules::ge(*v, 0.0);
        operator / set_operator: Operator = |_| Ok(());
        observation_type / set_observation_type: ObservationType = |_| Ok(());
        requests / set_requests: Vec<Request> = |_| Ok(());
    }
}

impl RequestGroup {
    pub fn new(
        name: impl Into<String>,
        proposal: impl Into<String>,
        ipp_value: f64,
        operator: Operator,
        observation_type: ObservationType,
    ) -> ModelResult<Self> {
        let group = Self {
            name: name.into(),
            proposal: proposal.into(),
            ipp_value,
            operator,
            observation_type,
            requests: Vec::new(),
        };
        group.validate_fields()?;
        Ok(group)
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.requests.push(request);
        self
    }

    pub fn push_request(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn requests_mut(&mut self) -> &mut [Request] {
        &mut self.requests
    }
}

#[derive(Deserialize)]
struct RawRequestGroup {
    name: String,
    proposal: String,
    ipp_value: f64,
    operator: Operator,
    observation_type: ObservationType,
    #[serde(default)]
    requests: Vec<Request>,
}

impl TryFrom<RawRequestGroup> for RequestGroup {
    type Error = ValidationError;

    fn try_from(raw: RawRequestGroup) -> Result<Self, Self::Error> {
        let mut group = RequestGroup::new(
            raw.name,
            raw.proposal,
            raw.ipp_value,
            raw.operator,
            raw.observation_type,
        )?;
        group.requests = raw.requests;
        Ok(group)
    }
}

/// A request group as echoed back by the observatory after submission.
///
/// Only ever produced by parsing a response. Use [`Self::into_group`] to edit
/// and resubmit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedRequestGroup {
    id: u64,
    state: RequestGroupState,
    submitter: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    #[serde(flatten)]
    group: RequestGroup,
}

impl SubmittedRequestGroup {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> RequestGroupState {
        self.state
    }

    pub fn submitter(&self) -> &str {
        &self.submitter
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn group(&self) -> &RequestGroup {
        &self.group
    }

    pub fn into_group(self) -> RequestGroup {
        self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::SiderealTarget;
    use crate::ocs::constraints::Constraints;
    use crate::ocs::instrument::{ConfigurationType, Instrument};
    use crate::ocs::registry::Lco1M0ScicamSinistro as Sinistro;
    use chrono::{Duration, TimeZone};

    fn configuration() -> Configuration {
        Sinistro::configuration(
            ConfigurationType::Expose,
            SiderealTarget::new("M51", 202.469, 47.195).unwrap(),
            Constraints::default(),
            vec![Sinistro::instrument_config(
                1,
                10.0,
                "central_2k_2x2",
                None,
                Sinistro::optical_elements(&[("filter", "B")]).unwrap(),
            )
            .unwrap()],
            Sinistro::acquisition_config("OFF").unwrap(),
            Sinistro::guiding_config("ON", true).unwrap(),
        )
        .unwrap()
        .into()
    }

    fn window() -> Window {
        let start = Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap();
        Window::new(Some(start.into()), start + Duration::days(30)).unwrap()
    }

    fn request() -> Request {
        Request::new(vec![configuration()], vec![window()], Location::telescope_class("1m0")).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let r = request();
        assert_eq!(*r.acceptability_threshold(), 90.0);
        assert_eq!(*r.configuration_repeats(), 1);
        assert_eq!(r.observation_note(), "");
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("optimization_type").is_none());
        assert!(json.get("cadence").is_none());
        assert_eq!(json["location"], serde_json::json!({"telescope_class": "1m0"}));
    }

    #[test]
    fn test_request_requires_configurations_and_windows() {
        let err = Request::new(vec![], vec![window()], Location::telescope_class("1m0")).unwrap_err();
        assert_eq!(err.code(), "too_short");
        assert_eq!(err.field(), Some("configurations"));

        let mut r = request();
        assert_eq!(r.set_windows(Vec::new()).unwrap_err().field(), Some("windows"));
        assert_eq!(r.windows().len(), 1);
    }

    #[test]
    fn test_request_bounds() {
        let mut r = request();
        assert_eq!(r.set_acceptability_threshold(100.5).unwrap_err().code(), "less_than_equal");
        assert_eq!(r.set_configuration_repeats(0u32).unwrap_err().code(), "greater_than_equal");
        assert_eq!(r.set_observation_note("x".repeat(256)).unwrap_err().code(), "string_too_long");
        r.set_optimization_type(Some(OptimizationType::Airmass)).unwrap();
        assert_eq!(serde_json::to_value(&r).unwrap()["optimization_type"], "AIRMASS");
    }

    #[test]
    fn test_cadence_rules() {
        let start = Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap();
        assert!(Cadence::new(start, start + Duration::days(2), 24.0, 1.0).is_ok());
        assert_eq!(
            Cadence::new(start, start + Duration::days(2), 0.01, 1.0).unwrap_err().field(),
            Some("period")
        );
        assert_eq!(
            Cadence::new(start, start - Duration::days(2), 24.0, 1.0).unwrap_err().code(),
            "invalid_order"
        );
    }

    #[test]
    fn test_ipp_value_assignment_keeps_previous() {
        let mut group = RequestGroup::new("test", "LCO2025A-001", 1.0, Operator::Single, ObservationType::Normal)
            .unwrap()
            .with_request(request());
        let err = group.set_ipp_value(-1.0).unwrap_err();
        assert_eq!(err.field(), Some("ipp_value"));
        assert_eq!(err.code(), "greater_than_equal");
        assert_eq!(*group.ipp_value(), 1.0);
    }

    #[test]
    fn test_group_name_length() {
        let err = RequestGroup::new("n".repeat(51), "p", 1.0, Operator::Single, ObservationType::Normal)
            .unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_group_top_level_keys() {
        let group = RequestGroup::new("test", "LCO2025A-001", 1.05, Operator::Single, ObservationType::Normal)
            .unwrap()
            .with_request(request());
        let json = serde_json::to_value(&group).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["name", "proposal", "ipp_value", "operator", "observation_type", "requests"]
        );
        assert_eq!(json["requests"][0]["configurations"][0]["instrument_type"], "1M0-SCICAM-SINISTRO");
    }

    #[test]
    fn test_submitted_group_parses_echo() {
        let group = RequestGroup::new("test", "LCO2025A-001", 1.0, Operator::Single, ObservationType::Normal)
            .unwrap()
            .with_request(request());
        let mut json = serde_json::to_value(&group).unwrap();
        let echo = json.as_object_mut().unwrap();
        echo.insert("id".into(), 1234.into());
        echo.insert("state".into(), "PENDING".into());
        echo.insert("submitter".into(), "observer".into());
        echo.insert("created".into(), "2025-04-10T12:00:00.123456Z".into());
        echo.insert("modified".into(), "2025-04-10T12:00:00.123456Z".into());

        let submitted: SubmittedRequestGroup = serde_json::from_value(json).unwrap();
        assert_eq!(submitted.id(), 1234);
        assert_eq!(submitted.state(), RequestGroupState::Pending);
        assert_eq!(submitted.group(), &group);
        assert_eq!(submitted.into_group().name(), "test");
    }
}

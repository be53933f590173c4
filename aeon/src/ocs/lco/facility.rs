//! Client for the Las Cumbres Observatory observation portal.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::ocs::request::{RequestGroup, SubmittedRequestGroup};
use crate::payload::{self, OutputMapping, PayloadError};

/// Errors from talking to an observation portal.
#[derive(Debug, thiserror::Error)]
pub enum FacilityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The portal refused a payload that passed local validation.
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("invalid facility configuration: {0}")]
    Config(String),
}

pub type FacilityResult<T> = Result<T, FacilityError>;

/// A proposal the authenticated user belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub requestgroup_count: u64,
    /// Remaining fields as returned by the portal.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    next: Option<String>,
    results: Vec<T>,
}

/// Result of asking the portal to check a request group without submitting it.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Accepted; carries the per-request durations the portal computed.
    Valid { request_durations: Value },
    /// Refused; carries the portal's `errors` member, or the whole body when absent.
    Invalid { errors: Value },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid { .. })
    }

    pub fn errors(&self) -> Option<&Value> {
        match self {
            ValidationOutcome::Valid { .. } => None,
            ValidationOutcome::Invalid { errors } => Some(errors),
        }
    }

    fn from_response(body: Value) -> Self {
        let durations = body.get("request_durations").filter(|value| is_truthy(value));
        match durations {
            Some(durations) => ValidationOutcome::Valid {
                request_durations: durations.clone(),
            },
            None => ValidationOutcome::Invalid {
                errors: body
                    .get("errors")
                    .filter(|errors| !errors.is_null())
                    .cloned()
                    .unwrap_or_else(|| Value::Array(vec![Value::String(body.to_string())])),
            },
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
    }
}

/// Observation portal client for LCO.
///
/// Configured from `AEON_LCO_TOKEN` and `AEON_LCO_API_ROOT`. Requests are
/// sent unauthenticated when no token is set.
#[derive(Debug, Clone)]
pub struct LcoFacility {
    client: Client,
    api_root: String,
}

impl LcoFacility {
    pub fn new(settings: &Settings) -> FacilityResult<Self> {
        let token = Some(settings.lco_token.as_str()).filter(|t| !t.is_empty());
        if token.is_none() {
            log::info!("AEON_LCO_TOKEN setting is missing, requests will be unauthenticated");
        }
        Self::with_api_root(&settings.lco_api_root, token)
    }

    /// Client for any OCS-compatible portal.
    pub fn with_api_root(api_root: &str, token: Option<&str>) -> FacilityResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Token {}", token))
                .map_err(|e| FacilityError::Config(format!("invalid API token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            api_root: api_root.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    /// Every proposal visible to the caller, following pagination links.
    pub async fn proposals(&self) -> FacilityResult<Vec<Proposal>> {
        let mut url = Some(self.url("/proposals/"));
        let mut proposals = Vec::new();
        while let Some(next) = url {
            let response = self.client.get(&next).send().await?.error_for_status()?;
            let page: Page<Proposal> = response.json().await?;
            log::debug!("Fetched {} proposals from {}", page.results.len(), next);
            proposals.extend(page.results);
            url = page.next;
        }
        Ok(proposals)
    }

    /// The JSON body sent for `group`; orbital epochs are written as MJD.
    pub fn serialize_request_group(&self, group: &RequestGroup) -> FacilityResult<Map<String, Value>> {
        Ok(payload::to_payload(group, &OutputMapping::lco())?)
    }

    /// Ask the portal whether `group` would be accepted.
    pub async fn validate_request_group(&self, group: &RequestGroup) -> FacilityResult<ValidationOutcome> {
        let payload = self.serialize_request_group(group)?;
        log::debug!("LcoFacility.validate_request_group -> {}", Value::Object(payload.clone()));
        let response = self
            .client
            .post(self.url("/requestgroups/validate/"))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        log::debug!("<- {}", body);
        let body: Value = serde_json::from_str(&body).map_err(|_| rejected(status, body))?;
        Ok(ValidationOutcome::from_response(body))
    }

    /// Submit `group` for scheduling.
    pub async fn submit_request_group(&self, group: &RequestGroup) -> FacilityResult<SubmittedRequestGroup> {
        let payload = self.serialize_request_group(group)?;
        log::debug!("-> {}", Value::Object(payload.clone()));
        let response = self
            .client
            .post(self.url("/requestgroups/"))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        log::debug!("<- {}", body);
        if !status.is_success() {
            return Err(rejected(status, body));
        }
        Ok(payload::from_json_str(&body)?)
    }
}

fn rejected(status: StatusCode, body: String) -> FacilityError {
    FacilityError::Rejected {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_outcome_from_durations() {
        let outcome = ValidationOutcome::from_response(json!({
            "request_durations": {"duration": 1200},
            "errors": {}
        }));
        assert!(outcome.is_valid());
        assert!(outcome.errors().is_none());
    }

    #[test]
    fn test_validation_outcome_empty_durations_is_invalid() {
        let outcome = ValidationOutcome::from_response(json!({
            "request_durations": {},
            "errors": {"requests": [{"windows": ["Window end is before start"]}]}
        }));
        assert!(!outcome.is_valid());
        assert_eq!(
            outcome.errors().unwrap()["requests"][0]["windows"][0],
            "Window end is before start"
        );
    }

    #[test]
    fn test_validation_outcome_without_errors_member() {
        let outcome = ValidationOutcome::from_response(json!({"detail": "Invalid token."}));
        let errors = outcome.errors().unwrap().as_array().unwrap();
        assert!(errors[0].as_str().unwrap().contains("Invalid token."));
    }

    #[test]
    fn test_url_joining() {
        let facility = LcoFacility::with_api_root("https://observe.lco.global/api/", None).unwrap();
        assert_eq!(facility.api_root(), "https://observe.lco.global/api");
        assert_eq!(
            facility.url("/requestgroups/validate/"),
            "https://observe.lco.global/api/requestgroups/validate/"
        );
    }

    #[test]
    fn test_bad_token_is_config_error() {
        let err = LcoFacility::with_api_root("http://localhost", Some("bad\ntoken")).unwrap_err();
        assert!(matches!(err, FacilityError::Config(_)));
    }
}

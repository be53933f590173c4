//! Client for SOAR, which is scheduled through the LCO observation portal.

use serde_json::{Map, Value};

use crate::config::Settings;
use crate::ocs::lco::facility::{FacilityResult, LcoFacility, Proposal, ValidationOutcome};
use crate::ocs::request::{RequestGroup, SubmittedRequestGroup};

/// Observation portal client for SOAR.
///
/// Authenticates with `AEON_SOAR_TOKEN`, falling back to `AEON_LCO_TOKEN`,
/// against `AEON_SOAR_API_ROOT`.
#[derive(Debug, Clone)]
pub struct SoarFacility {
    inner: LcoFacility,
}

impl SoarFacility {
    pub fn new(settings: &Settings) -> FacilityResult<Self> {
        let inner = LcoFacility::with_api_root(&settings.soar_api_root, select_token(settings))?;
        Ok(Self { inner })
    }

    pub fn api_root(&self) -> &str {
        self.inner.api_root()
    }

    pub async fn proposals(&self) -> FacilityResult<Vec<Proposal>> {
        self.inner.proposals().await
    }

    pub fn serialize_request_group(&self, group: &RequestGroup) -> FacilityResult<Map<String, Value>> {
        self.inner.serialize_request_group(group)
    }

    pub async fn validate_request_group(&self, group: &RequestGroup) -> FacilityResult<ValidationOutcome> {
        self.inner.validate_request_group(group).await
    }

    pub async fn submit_request_group(&self, group: &RequestGroup) -> FacilityResult<SubmittedRequestGroup> {
        self.inner.submit_request_group(group).await
    }
}

fn select_token(settings: &Settings) -> Option<&str> {
    if !settings.soar_token.is_empty() {
        return Some(settings.soar_token.as_str());
    }
    log::warn!("AEON_SOAR_TOKEN setting is missing, trying LCO credentials");
    if !settings.lco_token.is_empty() {
        return Some(settings.lco_token.as_str());
    }
    log::warn!("AEON_LCO_TOKEN setting is missing, requests will be unauthenticated");
    None
}

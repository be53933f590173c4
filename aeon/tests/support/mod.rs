#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use aeon::models::{
    NonSiderealTarget, NonSiderealType, OrbitalElements, Scheme, SiderealTarget, TimeScale, TimeValue,
    Window,
};
use aeon::ocs::lco::Lco1M0ScicamSinistro;
use aeon::ocs::{
    Configuration, ConfigurationType, Constraints, Instrument, Location, ObservationType, Operator,
    Request, RequestGroup,
};
use aeon::Settings;
use chrono::{Duration, TimeZone, Utc};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process
/// environment, since tests run in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

/// Every `AEON_*` variable cleared, so ambient settings cannot leak in.
pub fn clean_env() -> Vec<(&'static str, Option<&'static str>)> {
    [
        "AEON_CONFIG",
        "AEON_LCO_TOKEN",
        "AEON_LCO_API_ROOT",
        "AEON_SOAR_TOKEN",
        "AEON_SOAR_API_ROOT",
        "AEON_ESO_ENVIRONMENT",
        "AEON_ESO_USERNAME",
        "AEON_ESO_PASSWORD",
    ]
    .into_iter()
    .map(|key| (key, None))
    .collect()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn m51() -> SiderealTarget {
    SiderealTarget::new("M51", 202.469, 47.195).unwrap()
}

pub fn ceres() -> NonSiderealTarget {
    NonSiderealTarget::new(
        "Ceres",
        NonSiderealType::OrbitalElements,
        Scheme::MpcMinorPlanet,
        OrbitalElements {
            epochofel: TimeValue::from_mjd(60676.0, TimeScale::Utc).unwrap(),
            orbinc: 10.587.into(),
            longascnode: 80.25.into(),
            argofperih: 73.3.into(),
            eccentricity: 0.0796,
            meandist: 2.7656,
            meananom: 145.84.into(),
        },
    )
    .unwrap()
}

/// Sinistro imaging in the central 2k binned readout through the B filter.
pub fn sinistro_configuration(target: impl Into<aeon::models::Target>) -> Configuration {
    Lco1M0ScicamSinistro::configuration(
        ConfigurationType::Expose,
        target,
        Constraints::default(),
        vec![Lco1M0ScicamSinistro::instrument_config(
            1,
            10.0,
            "central_2k_2x2",
            None,
            Lco1M0ScicamSinistro::optical_elements(&[("filter", "B")]).unwrap(),
        )
        .unwrap()],
        Lco1M0ScicamSinistro::acquisition_config("OFF").unwrap(),
        Lco1M0ScicamSinistro::guiding_config("ON", true).unwrap(),
    )
    .unwrap()
    .into()
}

/// Thirty days starting now.
pub fn next_month() -> Window {
    let now = Utc::now();
    Window::new(Some(now.into()), now + Duration::days(30)).unwrap()
}

pub fn april_window() -> Window {
    let start = Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap();
    Window::new(Some(start.into()), start + Duration::days(30)).unwrap()
}

pub fn request_group(configuration: Configuration, window: Window) -> RequestGroup {
    let request = Request::new(vec![configuration], vec![window], Location::telescope_class("1m0")).unwrap();
    RequestGroup::new("aeon test", "TEST2025A-001", 1.05, Operator::Single, ObservationType::Normal)
        .unwrap()
        .with_request(request)
}

pub fn sinistro_group() -> RequestGroup {
    request_group(sinistro_configuration(m51()), next_month())
}

/// Settings pointing both networks at `api_root`.
pub fn settings_for(api_root: &str, lco_token: &str, soar_token: &str) -> Settings {
    Settings {
        lco_token: lco_token.to_string(),
        lco_api_root: api_root.to_string(),
        soar_token: soar_token.to_string(),
        soar_api_root: api_root.to_string(),
        ..Settings::default()
    }
}

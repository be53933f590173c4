//! Facility settings.
//!
//! Settings come from an optional TOML file and `AEON_*` environment
//! variables, the environment taking precedence. Every field has a default so
//! an empty environment still yields usable (unauthenticated) settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "AEON_";
/// Environment variable naming a TOML settings file for [`Settings::load`].
pub const CONFIG_PATH_VAR: &str = "AEON_CONFIG";
pub const DEFAULT_OCS_API_ROOT: &str = "https://observe.lco.global/api/";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Credentials and endpoints for every facility.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Las Cumbres Observatory
    pub lco_token: String,
    pub lco_api_root: String,

    // SOAR, served through the LCO observation portal
    pub soar_token: String,
    pub soar_api_root: String,

    // European Southern Observatory
    pub eso_environment: String,
    pub eso_username: String,
    pub eso_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lco_token: String::new(),
            lco_api_root: DEFAULT_OCS_API_ROOT.to_string(),
            soar_token: String::new(),
            soar_api_root: DEFAULT_OCS_API_ROOT.to_string(),
            eso_environment: "demo".to_string(),
            eso_username: String::new(),
            eso_password: String::new(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(secret: &str) -> &'static str {
            if secret.is_empty() {
                "<unset>"
            } else {
                "<redacted>"
            }
        }
        f.debug_struct("Settings")
            .field("lco_token", &redact(&self.lco_token))
            .field("lco_api_root", &self.lco_api_root)
            .field("soar_token", &redact(&self.soar_token))
            .field("soar_api_root", &self.soar_api_root)
            .field("eso_environment", &self.eso_environment)
            .field("eso_username", &self.eso_username)
            .field("eso_password", &redact(&self.eso_password))
            .finish()
    }
}

impl Settings {
    /// Defaults overridden by `AEON_*` environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Load settings from a TOML file. Missing keys take their defaults.
    ///
    /// # Arguments
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    /// * `Ok(Settings)` if the file was read and parsed
    /// * `Err(ConfigError)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The file named by `AEON_CONFIG` (when set), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => {
                log::debug!("Loading settings from {}", Path::new(&path).display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 7] = [
            ("LCO_TOKEN", &mut self.lco_token),
            ("LCO_API_ROOT", &mut self.lco_api_root),
            ("SOAR_TOKEN", &mut self.soar_token),
            ("SOAR_API_ROOT", &mut self.soar_api_root),
            ("ESO_ENVIRONMENT", &mut self.eso_environment),
            ("ESO_USERNAME", &mut self.eso_username),
            ("ESO_PASSWORD", &mut self.eso_password),
        ];
        for (suffix, field) in fields {
            if let Some(value) = lookup(&format!("{}{}", ENV_PREFIX, suffix)) {
                *field = value;
            }
        }
    }
}

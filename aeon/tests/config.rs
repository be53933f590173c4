//! Settings from the environment and from TOML files.

mod support;

use std::io::Write;

use aeon::config::{ConfigError, DEFAULT_OCS_API_ROOT};
use aeon::Settings;
use support::with_scoped_env;

fn env_with<'a>(extra: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
    let mut changes: Vec<(&'a str, Option<&'a str>)> = support::clean_env();
    changes.extend_from_slice(extra);
    changes
}

#[test]
fn from_env_reads_prefixed_variables() {
    let changes = env_with(&[
        ("AEON_LCO_TOKEN", Some("lco-token")),
        ("AEON_SOAR_API_ROOT", Some("https://soar.example/api/")),
    ]);
    let settings = with_scoped_env(&changes, Settings::from_env);
    assert_eq!(settings.lco_token, "lco-token");
    assert_eq!(settings.soar_api_root, "https://soar.example/api/");
    assert_eq!(settings.lco_api_root, DEFAULT_OCS_API_ROOT);
    assert_eq!(settings.eso_environment, "demo");
}

#[test]
fn empty_environment_gives_defaults() {
    let settings = with_scoped_env(&support::clean_env(), Settings::from_env);
    assert_eq!(settings, Settings::default());
}

#[test]
fn load_layers_environment_over_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
lco_token = "from-file"
soar_token = "soar-from-file"
eso_environment = "production"
"#
    )
    .unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let changes = env_with(&[("AEON_CONFIG", Some(path.as_str())), ("AEON_LCO_TOKEN", Some("from-env"))]);
    let settings = with_scoped_env(&changes, Settings::load).unwrap();
    assert_eq!(settings.lco_token, "from-env");
    assert_eq!(settings.soar_token, "soar-from-file");
    assert_eq!(settings.eso_environment, "production");
    assert_eq!(settings.lco_api_root, DEFAULT_OCS_API_ROOT);
}

#[test]
fn load_without_file_uses_environment() {
    let changes = env_with(&[("AEON_ESO_USERNAME", Some("observer"))]);
    let settings = with_scoped_env(&changes, Settings::load).unwrap();
    assert_eq!(settings.eso_username, "observer");
}

#[test]
fn missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aeon.toml");
    std::fs::write(&path, "lco_token = [1, 2").unwrap();
    let err = Settings::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

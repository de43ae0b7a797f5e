//! Integration tests for config loading from fixture files.

use std::fs;
use std::path::Path;

/// Read the sample config file content.
fn read_sample_config() -> String {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    fs::read_to_string(config_path).expect("Failed to read sample config file")
}

#[test]
fn sample_config_file_exists() {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    assert!(config_path.exists(), "Sample config file should exist");
}

#[test]
fn sample_config_is_valid_toml() {
    let config_content = read_sample_config();
    let result: Result<toml::Value, _> = toml::from_str(&config_content);
    assert!(result.is_ok(), "Sample config should be valid TOML: {:?}", result.err());
}

#[test]
fn sidecar_section_has_expected_structure() {
    let config_content = read_sample_config();
    let value: toml::Value = toml::from_str(&config_content).expect("should parse");

    let sidecar = value.get("sidecar").expect("should have sidecar section");

    for key in [
        "raw_suffix",
        "sidecar_suffix",
        "check_time",
        "destination",
        "hidden",
        "auto",
        "dryrun",
        "log",
        "verbose",
    ] {
        assert!(sidecar.get(key).is_some(), "sidecar section should have '{key}'");
    }
}

#[test]
fn sidecar_section_suffixes_differ() {
    let config_content = read_sample_config();
    let value: toml::Value = toml::from_str(&config_content).expect("should parse");

    let sidecar = value.get("sidecar").expect("should have sidecar section");
    let raw = sidecar.get("raw_suffix").and_then(toml::Value::as_str).expect("raw suffix");
    let side = sidecar
        .get("sidecar_suffix")
        .and_then(toml::Value::as_str)
        .expect("sidecar suffix");
    assert!(!raw.eq_ignore_ascii_case(side));
}

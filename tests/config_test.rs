//! Integration tests for configuration loading

use frm_exporter::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[frm]
address = "http://10.0.0.5:8080/"
timeout_ms = 2500

[collectors]
interval_secs = 15
vehicles = false

[vehicles]
registration_speed_limit = 4.0
nearby_distance = 1500.0
heading_tolerance_deg = 20.0

[metrics]
prometheus_port = 9187
bind_address = "127.0.0.1"
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.frm_address(), "http://10.0.0.5:8080");
    assert_eq!(config.frm_timeout_ms(), 2500);
    assert_eq!(config.poll_interval_secs(), 15);
    assert!(config.trains_enabled());
    assert!(!config.vehicles_enabled());
    assert!(config.production_enabled());
    assert_eq!(config.registration_speed_limit(), 4.0);
    assert_eq!(config.nearby_distance(), 1500.0);
    assert_eq!(config.heading_tolerance_deg(), 20.0);
    assert_eq!(config.prometheus_port(), 9187);
    assert_eq!(config.bind_address(), "127.0.0.1");
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_invalid_file_is_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[collectors]\ninterval_secs = \"often\"\n").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.frm_address(), "http://localhost:8080");
    assert_eq!(config.poll_interval_secs(), 5);
    assert_eq!(config.nearby_distance(), 5000.0);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_shipped_dev_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/dev.toml");
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.frm_address(), "http://localhost:8080");
    assert_eq!(config.prometheus_port(), 9100);
}

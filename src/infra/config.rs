//! Configuration loading from TOML files
//!
//! The binary takes the file path from its `--config` flag (default
//! `config/dev.toml`). A missing or unparsable file falls back to defaults
//! with a warning.
//!
//! Every table and key is optional; missing values fall back to defaults.
//! Values that would stall the collectors are replaced on load.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct FrmConfig {
    /// Base address of the FRM web server, without trailing path
    #[serde(default = "default_frm_address")]
    pub address: String,
    /// Per-request timeout
    #[serde(default = "default_frm_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for FrmConfig {
    fn default() -> Self {
        Self { address: default_frm_address(), timeout_ms: default_frm_timeout_ms() }
    }
}

fn default_frm_address() -> String {
    "http://localhost:8080".to_string()
}

fn default_frm_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorsConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_enabled")]
    pub trains: bool,
    #[serde(default = "default_enabled")]
    pub vehicles: bool,
    #[serde(default = "default_enabled")]
    pub production: bool,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            trains: default_enabled(),
            vehicles: default_enabled(),
            production: default_enabled(),
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehiclesConfig {
    /// Vehicles faster than this are not registered for trip timing
    #[serde(default = "default_registration_speed_limit")]
    pub registration_speed_limit: f64,
    /// Radius around the home position that counts as "nearby" (world units)
    #[serde(default = "default_nearby_distance")]
    pub nearby_distance: f64,
    /// Maximum heading difference that counts as the same direction (degrees)
    #[serde(default = "default_heading_tolerance_deg")]
    pub heading_tolerance_deg: f64,
}

impl Default for VehiclesConfig {
    fn default() -> Self {
        Self {
            registration_speed_limit: default_registration_speed_limit(),
            nearby_distance: default_nearby_distance(),
            heading_tolerance_deg: default_heading_tolerance_deg(),
        }
    }
}

fn default_registration_speed_limit() -> f64 {
    10.0
}

fn default_nearby_distance() -> f64 {
    5_000.0
}

fn default_heading_tolerance_deg() -> f64 {
    30.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus metrics HTTP port (0 to disable)
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { prometheus_port: default_prometheus_port(), bind_address: default_bind_address() }
    }
}

fn default_prometheus_port() -> u16 {
    9100
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub frm: FrmConfig,
    #[serde(default)]
    pub collectors: CollectorsConfig,
    #[serde(default)]
    pub vehicles: VehiclesConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    frm_address: String,
    frm_timeout_ms: u64,
    poll_interval_secs: u64,
    trains_enabled: bool,
    vehicles_enabled: bool,
    production_enabled: bool,
    registration_speed_limit: f64,
    nearby_distance: f64,
    heading_tolerance_deg: f64,
    prometheus_port: u16,
    bind_address: String,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

/// Minimum per-request timeout; anything shorter fails every fetch
const MIN_FRM_TIMEOUT_MS: u64 = 100;

/// Keep a tolerance if it is a usable non-negative number, otherwise warn and
/// use the default
fn sanitize_tolerance(key: &'static str, value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!(key, value, fallback, "config_value_invalid_using_default");
        fallback
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        let frm_timeout_ms = if toml_config.frm.timeout_ms < MIN_FRM_TIMEOUT_MS {
            warn!(
                key = "frm.timeout_ms",
                value = toml_config.frm.timeout_ms,
                min = MIN_FRM_TIMEOUT_MS,
                "config_value_clamped"
            );
            MIN_FRM_TIMEOUT_MS
        } else {
            toml_config.frm.timeout_ms
        };

        let vehicles = &toml_config.vehicles;
        let registration_speed_limit = sanitize_tolerance(
            "vehicles.registration_speed_limit",
            vehicles.registration_speed_limit,
            default_registration_speed_limit(),
        );
        let nearby_distance = sanitize_tolerance(
            "vehicles.nearby_distance",
            vehicles.nearby_distance,
            default_nearby_distance(),
        );
        let heading_tolerance_deg = sanitize_tolerance(
            "vehicles.heading_tolerance_deg",
            vehicles.heading_tolerance_deg,
            default_heading_tolerance_deg(),
        )
        .min(180.0);

        Self {
            frm_address: toml_config.frm.address.trim_end_matches('/').to_string(),
            frm_timeout_ms,
            poll_interval_secs: toml_config.collectors.interval_secs.max(1),
            trains_enabled: toml_config.collectors.trains,
            vehicles_enabled: toml_config.collectors.vehicles,
            production_enabled: toml_config.collectors.production,
            registration_speed_limit,
            nearby_distance,
            heading_tolerance_deg,
            prometheus_port: toml_config.metrics.prometheus_port,
            bind_address: toml_config.metrics.bind_address,
            config_file,
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig =
            toml::from_str(content).context("Failed to parse config")?;
        Ok(Self::from_toml(toml_config, "inline".to_string()))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration from a path, falling back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn frm_address(&self) -> &str {
        &self.frm_address
    }

    pub fn frm_timeout_ms(&self) -> u64 {
        self.frm_timeout_ms
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    pub fn trains_enabled(&self) -> bool {
        self.trains_enabled
    }

    pub fn vehicles_enabled(&self) -> bool {
        self.vehicles_enabled
    }

    pub fn production_enabled(&self) -> bool {
        self.production_enabled
    }

    pub fn registration_speed_limit(&self) -> f64 {
        self.registration_speed_limit
    }

    pub fn nearby_distance(&self) -> f64 {
        self.nearby_distance
    }

    pub fn heading_tolerance_deg(&self) -> f64 {
        self.heading_tolerance_deg
    }

    pub fn prometheus_port(&self) -> u16 {
        self.prometheus_port
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set vehicle tolerances
    #[cfg(test)]
    pub fn with_vehicle_tolerances(
        mut self,
        nearby_distance: f64,
        heading_tolerance_deg: f64,
    ) -> Self {
        self.nearby_distance = nearby_distance;
        self.heading_tolerance_deg = heading_tolerance_deg;
        self
    }
}

//! Run configuration.
//!
//! The defaults are compiled in from `config/krasecology.toml`. A `Config` is
//! built once in `main` and handed explicitly to every stage, so tests can
//! point the source at a mock server and drop the request delay to zero.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::stations::{self, Station};

const DEFAULT_CONFIG: &str = include_str!("../config/krasecology.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub report: ReportConfig,
    #[serde(skip, default = "stations::default_stations")]
    pub stations: Vec<Station>,
}

/// Where and how politely to talk to the source site.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Sensor list URL template, `{station}` is replaced by the station id.
    pub sensor_list_url: String,
    /// Sensor data URL template with `{code}` and `{interval}` placeholders.
    pub sensor_data_url: String,
    pub utc_offset_hours: i64,
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Prefix of the output file name.
    pub site_label: String,
    pub column_width: f64,
    /// Directory for the workbook. `None` means the user's Desktop.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Parses the built-in configuration.
    pub fn load_default() -> Result<Config, ConfigError> {
        Config::from_toml(DEFAULT_CONFIG)
    }

    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

impl SourceConfig {
    /// Rebuilds both URL templates against another host, keeping the
    /// source's path layout.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.sensor_list_url = format!("{}/Main/GetAirSensorList/{{station}}", base);
        self.sensor_data_url =
            format!("{}/Main/GetAirSensorData/{{code}}?timelap={{interval}}", base);
        self
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ReportConfig {
    /// The configured output directory, else Desktop, else home, else cwd.
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::desktop_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_parses() {
        let config = Config::load_default().expect("built-in config must parse");
        assert_eq!(config.source.utc_offset_hours, 7);
        assert_eq!(config.source.request_delay(), Duration::from_millis(500));
        assert_eq!(config.report.site_label, "krasecology.ru");
        assert_eq!(config.report.column_width, 20.0);
        assert!(config.report.output_dir.is_none());
        assert_eq!(config.stations.len(), stations::STATION_REGISTRY.len());
    }

    #[test]
    fn test_builtin_templates_carry_placeholders() {
        let config = Config::load_default().unwrap();
        assert!(config.source.sensor_list_url.contains("{station}"));
        assert!(config.source.sensor_data_url.contains("{code}"));
        assert!(config.source.sensor_data_url.contains("{interval}"));
    }

    #[test]
    fn test_with_base_url_rewrites_both_templates() {
        let source = Config::load_default()
            .unwrap()
            .source
            .with_base_url("http://127.0.0.1:4000/");
        assert_eq!(
            source.sensor_list_url,
            "http://127.0.0.1:4000/Main/GetAirSensorList/{station}"
        );
        assert_eq!(
            source.sensor_data_url,
            "http://127.0.0.1:4000/Main/GetAirSensorData/{code}?timelap={interval}"
        );
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let err = Config::from_toml("[source]\nsensor_list_url = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn test_explicit_output_dir_wins() {
        let mut report = Config::load_default().unwrap().report;
        report.output_dir = Some(PathBuf::from("/tmp/reports"));
        assert_eq!(report.resolve_output_dir(), PathBuf::from("/tmp/reports"));
    }
}

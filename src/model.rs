/// Interval, SensorDescriptor, SensorSeries, Report, and the error types
/// shared by every stage of the air-quality report.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only types and the small conversions that belong to them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Reporting interval
// ---------------------------------------------------------------------------

/// The reporting window requested from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Day,
    Week,
}

impl Interval {
    /// Query keyword understood by the data endpoint (`timelap=`).
    pub fn keyword(self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Week => "week",
        }
    }

    /// Human-readable label printed in the report.
    pub fn label(self) -> &'static str {
        match self {
            Interval::Day => "День",
            Interval::Week => "Неделя",
        }
    }

    /// Maps the interactive menu choice ("1" or "2") to an interval.
    pub fn from_choice(choice: &str) -> Option<Interval> {
        match choice.trim() {
            "1" => Some(Interval::Day),
            "2" => Some(Interval::Week),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor directory
// ---------------------------------------------------------------------------

/// A sensor installed at a station, as discovered from the sensor list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorDescriptor {
    /// Per-station ordinal, 1..N in discovery order.
    pub index: u32,
    pub name: String,
    /// Site-internal code used to build the data URL.
    pub code: String,
    /// Unit label, may contain `<sup>`/`<sub>` markup.
    pub unit: String,
}

/// Sensors of one station keyed by ordinal index.
pub type StationSensors = BTreeMap<u32, SensorDescriptor>;

/// Station id → ordinal index → sensor. Built once by the resolver.
pub type SensorDirectory = BTreeMap<u32, StationSensors>;

// ---------------------------------------------------------------------------
// Readings and the report
// ---------------------------------------------------------------------------

/// A single measurement with its timestamp as a spreadsheet serial date.
///
/// `value` is `None` when the feed publishes a gap (`"y": null`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub serial: f64,
    pub value: Option<f64>,
}

/// The readings collected for one sensor. An empty `readings` vector is the
/// normal representation of a sensor whose data could not be fetched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorSeries {
    pub unit: String,
    pub readings: Vec<Reading>,
}

impl SensorSeries {
    pub fn unavailable(unit: impl Into<String>) -> Self {
        SensorSeries {
            unit: unit.into(),
            readings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Sensor name → series, for one station.
pub type StationSeries = BTreeMap<String, SensorSeries>;

/// Everything the report writer needs, fully materialised in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub interval: Interval,
    /// Local wall-clock time the scan started.
    pub scanned_at: NaiveDateTime,
    /// Station display name → sensor name → series.
    pub stations: BTreeMap<String, StationSeries>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or ingesting one source document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// Non-2xx HTTP response.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// The body was not the JSON shape we expect.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(err)
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Per-unit source failures. Each is recovered at its unit boundary
/// (one station, one sensor) and never propagated further.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("sensor list for station {station_id} unavailable from {url}: {source}")]
    Discovery {
        station_id: u32,
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("data for sensor \"{sensor}\" unavailable from {url}: {source}")]
    Series {
        sensor: String,
        url: String,
        #[source]
        source: FetchError,
    },
}

impl SourceError {
    pub fn url(&self) -> &str {
        match self {
            SourceError::Discovery { url, .. } | SourceError::Series { url, .. } => url,
        }
    }

    pub fn fetch_error(&self) -> &FetchError {
        match self {
            SourceError::Discovery { source, .. } | SourceError::Series { source, .. } => source,
        }
    }
}

/// The workbook could not be built or written. Fatal for the run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_keywords_match_source_query() {
        assert_eq!(Interval::Day.keyword(), "day");
        assert_eq!(Interval::Week.keyword(), "week");
    }

    #[test]
    fn test_interval_from_choice() {
        assert_eq!(Interval::from_choice("1"), Some(Interval::Day));
        assert_eq!(Interval::from_choice(" 2\n"), Some(Interval::Week));
        assert_eq!(Interval::from_choice("3"), None);
        assert_eq!(Interval::from_choice("q"), None);
        assert_eq!(Interval::from_choice(""), None);
    }

    #[test]
    fn test_unavailable_series_keeps_unit() {
        let series = SensorSeries::unavailable("мг/м3");
        assert_eq!(series.unit, "мг/м3");
        assert!(series.is_empty());
    }

    #[test]
    fn test_source_error_exposes_url() {
        let err = SourceError::Series {
            sensor: "CO".to_string(),
            url: "http://example.invalid/101?timelap=day".to_string(),
            source: FetchError::Http(500),
        };
        assert_eq!(err.url(), "http://example.invalid/101?timelap=day");
        assert!(matches!(err.fetch_error(), FetchError::Http(500)));
        assert!(err.to_string().contains("HTTP error: 500"));
    }
}

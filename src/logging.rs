/// Structured logging for the air-quality report
///
/// Progress and failure lines go through `tracing`, tagged with the pipeline
/// stage and the resource (station or sensor) they concern. Fetch failures
/// are classified so an outage of the whole site stands out from a single
/// sensor that simply has no published data.

use std::fmt;

use tracing::{Level, error, info, warn};

use crate::model::{FetchError, SourceError};

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovery,
    Series,
    Report,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Discovery => write!(f, "LIST"),
            Stage::Series => write!(f, "DATA"),
            Stage::Report => write!(f, "XLSX"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The source says the resource does not exist (sensor retired, no data published)
    Expected,
    /// Transport trouble, server errors or a changed response format
    Unexpected,
    /// Cannot tell
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(min_level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(min_level)
        .with_target(false)
        .compact()
        .try_init();
}

// ---------------------------------------------------------------------------
// Failure logging
// ---------------------------------------------------------------------------

pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        FetchError::Http(404) => FailureType::Expected,
        FetchError::Http(status) if *status >= 500 => FailureType::Unexpected,
        FetchError::Http(_) => FailureType::Unknown,
        FetchError::Timeout | FetchError::Request(_) | FetchError::Parse(_) => {
            FailureType::Unexpected
        }
    }
}

/// Logs a recovered per-unit failure. `resource` names the station or
/// sensor for the progress line; the URL comes from the error.
pub fn log_source_failure(stage: Stage, resource: &str, err: &SourceError) {
    let failure_type = classify_fetch_failure(err.fetch_error());
    let url = err.url();

    match failure_type {
        FailureType::Unexpected => error!(
            stage = %stage,
            resource,
            url,
            kind = %failure_type,
            "Не удалось загрузить данные от {}: {}",
            url,
            err.fetch_error()
        ),
        FailureType::Expected | FailureType::Unknown => warn!(
            stage = %stage,
            resource,
            url,
            kind = %failure_type,
            "Не удалось загрузить данные от {}: {}",
            url,
            err.fetch_error()
        ),
    }
}

// ---------------------------------------------------------------------------
// Stage summaries
// ---------------------------------------------------------------------------

/// Log a summary of one stage's fetches.
pub fn log_stage_summary(stage: Stage, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "{}: {}/{} successful, {} failed",
        stage, successful, total, failed
    );

    if failed == 0 {
        info!(stage = %stage, "{}", message);
    } else if successful == 0 {
        error!(stage = %stage, "{}", message);
    } else {
        warn!(stage = %stage, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_expected() {
        assert_eq!(classify_fetch_failure(&FetchError::Http(404)), FailureType::Expected);
    }

    #[test]
    fn test_server_and_transport_failures_are_unexpected() {
        assert_eq!(classify_fetch_failure(&FetchError::Http(503)), FailureType::Unexpected);
        assert_eq!(classify_fetch_failure(&FetchError::Timeout), FailureType::Unexpected);
        assert_eq!(
            classify_fetch_failure(&FetchError::Parse("missing field `Data`".into())),
            FailureType::Unexpected
        );
    }

    #[test]
    fn test_other_client_errors_are_unknown() {
        assert_eq!(classify_fetch_failure(&FetchError::Http(403)), FailureType::Unknown);
        assert_eq!(classify_fetch_failure(&FetchError::Http(410)), FailureType::Unknown);
    }

    #[test]
    fn test_stage_tags() {
        assert_eq!(Stage::Discovery.to_string(), "LIST");
        assert_eq!(Stage::Series.to_string(), "DATA");
        assert_eq!(Stage::Report.to_string(), "XLSX");
    }

    #[test]
    fn test_logging_without_subscriber_does_not_panic() {
        let err = SourceError::Discovery {
            station_id: 1,
            url: "http://example.invalid/1".into(),
            source: FetchError::Timeout,
        };
        log_source_failure(Stage::Discovery, "Ачинск-Юго-Восточный", &err);
        log_stage_summary(Stage::Series, 3, 2, 1);
    }
}

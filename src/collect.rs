//! Time-series collection.
//!
//! Walks the sensor directory station by station and fetches every sensor's
//! readings for the requested interval. A sensor whose request fails keeps
//! its entry with an empty series, so the report can mark it as unavailable.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::config::SourceConfig;
use crate::directory::pause;
use crate::ingest::krasecology;
use crate::logging::{self, Stage};
use crate::model::{
    Interval, Reading, Report, SensorDescriptor, SensorDirectory, SensorSeries, SourceError,
    StationSeries,
};
use crate::stations::Station;

/// Collects every sensor's series for `stations`, in the order given.
///
/// Sensors are fetched in ascending ordinal order. The configured delay is
/// slept after each sensor request, success or not. `scanned_at` is stamped
/// on the report once.
pub fn collect_series(
    client: &reqwest::blocking::Client,
    source: &SourceConfig,
    stations: &[Station],
    directory: &SensorDirectory,
    interval: Interval,
    scanned_at: NaiveDateTime,
) -> Report {
    let mut report = Report {
        interval,
        scanned_at,
        stations: BTreeMap::new(),
    };

    info!("Получение данных от датчиков");

    let mut total = 0;
    let mut failed = 0;

    for station in stations {
        let mut series_by_name = StationSeries::new();

        if let Some(sensors) = directory.get(&station.id) {
            for sensor in sensors.values() {
                info!("Пост \"{}\" датчик \"{}\"", station.name, sensor.name);
                total += 1;

                let series = match fetch_series(client, source, sensor, interval) {
                    Ok(readings) => SensorSeries {
                        unit: sensor.unit.clone(),
                        readings,
                    },
                    Err(err) => {
                        logging::log_source_failure(Stage::Series, &sensor.name, &err);
                        failed += 1;
                        SensorSeries::unavailable(sensor.unit.clone())
                    }
                };

                let key = series_key(&series_by_name, sensor);
                if key != sensor.name {
                    warn!(
                        "Пост \"{}\": датчик \"{}\" повторяется, записан как \"{}\"",
                        station.name, sensor.name, key
                    );
                }
                series_by_name.insert(key, series);
                pause(source);
            }
        }

        report.stations.insert(station.name.to_string(), series_by_name);
    }

    logging::log_stage_summary(Stage::Series, total, total - failed, failed);
    report
}

fn fetch_series(
    client: &reqwest::blocking::Client,
    source: &SourceConfig,
    sensor: &SensorDescriptor,
    interval: Interval,
) -> Result<Vec<Reading>, SourceError> {
    let url = krasecology::build_sensor_data_url(source, &sensor.code, interval);
    krasecology::fetch_text(client, &url)
        .and_then(|body| krasecology::parse_sensor_data(&body, source.utc_offset_hours))
        .map_err(|source| SourceError::Series {
            sensor: sensor.name.clone(),
            url,
            source,
        })
}

/// Sensor names are the sheet's block titles. A repeated name within one
/// station gets the sensor code appended instead of replacing the earlier one.
fn series_key(existing: &StationSeries, sensor: &SensorDescriptor) -> String {
    if !existing.contains_key(&sensor.name) {
        return sensor.name.clone();
    }
    let with_code = format!("{} ({})", sensor.name, sensor.code);
    if !existing.contains_key(&with_code) {
        return with_code;
    }
    format!("{} ({}, #{})", sensor.name, sensor.code, sensor.index)
}

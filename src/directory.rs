//! Sensor directory resolution.
//!
//! For every station, one request to the sensor-list endpoint tells us which
//! sensors are installed there. A station whose list cannot be fetched keeps
//! an empty sensor map and the run moves on.

use std::thread;

use tracing::info;

use crate::config::SourceConfig;
use crate::ingest::krasecology::{self, SensorListEntry};
use crate::logging::{self, Stage};
use crate::model::{SensorDirectory, SourceError, StationSensors};
use crate::stations::Station;

/// Builds the sensor directory for `stations`, processed in ascending id order.
///
/// Every station appears in the result. The configured delay is slept after
/// each station's request whether it succeeded or not.
pub fn resolve_sensors(
    client: &reqwest::blocking::Client,
    source: &SourceConfig,
    stations: &[Station],
) -> SensorDirectory {
    let mut ordered = stations.to_vec();
    ordered.sort_by_key(|s| s.id);

    info!("Получение списка датчиков по постам");

    let mut directory = SensorDirectory::new();
    let mut failed = 0;

    for station in &ordered {
        let sensors = match fetch_sensor_list(client, source, station) {
            Ok(entries) => {
                info!("Пост \"{}\": {} датчиков", station.name, entries.len());
                station_sensors(entries)
            }
            Err(err) => {
                logging::log_source_failure(Stage::Discovery, station.name, &err);
                failed += 1;
                StationSensors::new()
            }
        };
        directory.insert(station.id, sensors);
        pause(source);
    }

    logging::log_stage_summary(Stage::Discovery, ordered.len(), ordered.len() - failed, failed);
    directory
}

fn fetch_sensor_list(
    client: &reqwest::blocking::Client,
    source: &SourceConfig,
    station: &Station,
) -> Result<Vec<SensorListEntry>, SourceError> {
    let url = krasecology::build_sensor_list_url(source, station.id);
    krasecology::fetch_text(client, &url)
        .and_then(|body| krasecology::parse_sensor_list(&body))
        .map_err(|source| SourceError::Discovery {
            station_id: station.id,
            url,
            source,
        })
}

/// Indexes one station's sensor list, wind rose excluded.
pub fn station_sensors(entries: Vec<SensorListEntry>) -> StationSensors {
    krasecology::index_sensors(entries)
        .into_iter()
        .map(|sensor| (sensor.index, sensor))
        .collect()
}

pub(crate) fn pause(source: &SourceConfig) {
    let delay = source.request_delay();
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

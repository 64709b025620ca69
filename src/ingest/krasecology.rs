/// krasecology.ru Air Sensor API Client
///
/// Two JSON endpoints back the operative air-quality page:
///   GetAirSensorList/{station}           → sensors installed at a post
///   GetAirSensorData/{code}?timelap=...  → one sensor's readings for a day or week
///
/// Page: http://krasecology.ru/operative/air

use serde::Deserialize;

use crate::config::SourceConfig;
use crate::model::{FetchError, Interval, Reading, SensorDescriptor};

/// Name of the compass-direction widget that appears in sensor lists but
/// carries no scalar time series.
pub const WIND_ROSE: &str = "Роза ветров";

/// Days from the spreadsheet epoch (1899-12-30) to the UNIX epoch.
pub const SERIAL_UNIX_EPOCH: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ============================================================================
// API Response Structures
// ============================================================================

/// One entry of the sensor list.
#[derive(Debug, Deserialize)]
pub struct SensorListEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Code")]
    pub code: SensorCode,
    #[serde(rename = "Unit", default)]
    pub unit: Option<String>,
}

/// Sensor codes arrive as either strings or numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SensorCode {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl SensorCode {
    pub fn as_code(&self) -> String {
        match self {
            SensorCode::Text(s) => s.trim().to_string(),
            SensorCode::Integer(n) => n.to_string(),
            SensorCode::Float(f) => f.to_string(),
        }
    }
}

/// Sensor data response.
#[derive(Debug, Deserialize)]
pub struct SensorDataResponse {
    #[serde(rename = "Data")]
    pub data: Vec<DataPoint>,
}

#[derive(Debug, Deserialize)]
pub struct DataPoint {
    pub x: EpochMillis,
    #[serde(default)]
    pub y: Option<PointValue>,
}

/// Epoch milliseconds, published as a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpochMillis {
    Integer(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Number(f64),
    Text(String),
}

impl EpochMillis {
    fn to_millis(&self) -> Result<i64, FetchError> {
        match self {
            EpochMillis::Integer(n) => Ok(*n),
            EpochMillis::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            EpochMillis::Float(f) => Err(FetchError::Parse(format!("invalid timestamp {}", f))),
            EpochMillis::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| FetchError::Parse(format!("invalid timestamp '{}'", s))),
        }
    }
}

impl PointValue {
    fn to_value(&self) -> Result<f64, FetchError> {
        match self {
            PointValue::Number(n) => Ok(*n),
            PointValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| FetchError::Parse(format!("invalid value '{}'", s))),
        }
    }
}

// ============================================================================
// URL construction
// ============================================================================

pub fn build_sensor_list_url(source: &SourceConfig, station_id: u32) -> String {
    source
        .sensor_list_url
        .replace("{station}", &station_id.to_string())
}

pub fn build_sensor_data_url(source: &SourceConfig, code: &str, interval: Interval) -> String {
    source
        .sensor_data_url
        .replace("{code}", code)
        .replace("{interval}", interval.keyword())
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Builds the blocking HTTP client used for the whole run.
pub fn build_client(source: &SourceConfig) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(source.request_timeout())
        .user_agent(concat!("krasecology_report/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// GETs `url` and returns the body. Non-2xx statuses are errors.
pub fn fetch_text(client: &reqwest::blocking::Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(FetchError::Http(response.status().as_u16()));
    }

    Ok(response.text()?)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a sensor list body.
pub fn parse_sensor_list(json: &str) -> Result<Vec<SensorListEntry>, FetchError> {
    Ok(serde_json::from_str(json)?)
}

/// Turns sensor list entries into indexed descriptors. The wind rose is
/// dropped before numbering, so indices stay contiguous from 1.
pub fn index_sensors(entries: Vec<SensorListEntry>) -> Vec<SensorDescriptor> {
    entries
        .into_iter()
        .filter(|entry| entry.name != WIND_ROSE)
        .zip(1u32..)
        .map(|(entry, index)| SensorDescriptor {
            index,
            code: entry.code.as_code(),
            unit: entry.unit.unwrap_or_default(),
            name: entry.name,
        })
        .collect()
}

/// Parses a sensor data body into readings, in source order.
pub fn parse_sensor_data(json: &str, utc_offset_hours: i64) -> Result<Vec<Reading>, FetchError> {
    let response: SensorDataResponse = serde_json::from_str(json)?;

    response
        .data
        .iter()
        .map(|point| {
            let millis = point.x.to_millis()?;
            let value = point.y.as_ref().map(PointValue::to_value).transpose()?;
            Ok(Reading {
                serial: to_serial(millis, utc_offset_hours),
                value,
            })
        })
        .collect()
}

/// Converts epoch milliseconds to a spreadsheet serial date in local time.
///
/// Milliseconds are truncated to whole seconds before the offset is applied:
///   serial = (ms / 1000 + offset_hours * 3600) / 86400 + 25569
pub fn to_serial(epoch_millis: i64, utc_offset_hours: i64) -> f64 {
    let seconds = epoch_millis / 1000 + utc_offset_hours * 3600;
    seconds as f64 / SECONDS_PER_DAY + SERIAL_UNIX_EPOCH
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{NaiveDate, NaiveDateTime};

    /// Spreadsheet serial for a naive local datetime, computed independently
    /// of `to_serial`.
    fn serial_of(dt: NaiveDateTime) -> f64 {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (dt - epoch).num_seconds() as f64 / 86_400.0
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_serial_of_unix_epoch_is_seven_am() {
        let expected = serial_of(
            NaiveDate::from_ymd_opt(1970, 1, 1)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
        );
        assert!(approx_eq(to_serial(0, 7), expected));
        assert!(approx_eq(to_serial(0, 7), 25569.0 + 7.0 / 24.0));
    }

    #[test]
    fn test_serial_matches_calendar_time() {
        // 1_000_000_000_000 ms = 2001-09-09 01:46:40 UTC → 08:46:40 at +7
        let expected = serial_of(
            NaiveDate::from_ymd_opt(2001, 9, 9)
                .unwrap()
                .and_hms_opt(8, 46, 40)
                .unwrap(),
        );
        assert!(approx_eq(to_serial(1_000_000_000_000, 7), expected));
    }

    #[test]
    fn test_serial_truncates_sub_second_part() {
        assert_eq!(to_serial(1_000_000_000_999, 7), to_serial(1_000_000_000_000, 7));
        assert!(to_serial(1_000_000_001_000, 7) > to_serial(1_000_000_000_999, 7));
    }

    #[test]
    fn test_serial_is_monotonic() {
        let mut previous = to_serial(0, 7);
        for millis in (0..5_000_000_i64).step_by(997) {
            let current = to_serial(millis, 7);
            assert!(current >= previous, "serial decreased at {} ms", millis);
            previous = current;
        }
    }

    #[test]
    fn test_index_sensors_skips_wind_rose() {
        let entries = parse_sensor_list(
            r#"[{"Name":"CO","Code":"101","Unit":"mg/m3"},
                {"Name":"Роза ветров","Code":"999","Unit":""},
                {"Name":"NO2","Code":102,"Unit":"мг/м<sup>3</sup>"}]"#,
        )
        .unwrap();
        let sensors = index_sensors(entries);

        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0].index, 1);
        assert_eq!(sensors[0].name, "CO");
        assert_eq!(sensors[0].code, "101");
        assert_eq!(sensors[1].index, 2);
        assert_eq!(sensors[1].name, "NO2");
        assert_eq!(sensors[1].code, "102");
        assert_eq!(sensors[1].unit, "мг/м<sup>3</sup>");
    }

    #[test]
    fn test_index_sensors_tolerates_missing_unit() {
        let entries =
            parse_sensor_list(r#"[{"Name":"Температура","Code":"7","Unit":null}]"#).unwrap();
        let sensors = index_sensors(entries);
        assert_eq!(sensors[0].unit, "");
    }

    #[test]
    fn test_parse_sensor_list_rejects_non_array() {
        let err = parse_sensor_list(r#"{"Name":"CO"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_parse_sensor_data_accepts_string_and_number_timestamps() {
        let readings = parse_sensor_data(
            r#"{"Data":[{"x":1000000000000,"y":12.5},{"x":"1000000060000","y":"13"}]}"#,
            7,
        )
        .unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].serial, to_serial(1_000_000_000_000, 7));
        assert_eq!(readings[0].value, Some(12.5));
        assert_eq!(readings[1].serial, to_serial(1_000_000_060_000, 7));
        assert_eq!(readings[1].value, Some(13.0));
    }

    #[test]
    fn test_parse_sensor_data_keeps_null_values_as_gaps() {
        let readings =
            parse_sensor_data(r#"{"Data":[{"x":1000000000000,"y":null}]}"#, 7).unwrap();
        assert_eq!(readings[0].value, None);
    }

    #[test]
    fn test_parse_sensor_data_empty_array() {
        let readings = parse_sensor_data(r#"{"Data":[]}"#, 7).unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn test_parse_sensor_data_missing_data_field() {
        let err = parse_sensor_data(r#"{"Items":[]}"#, 7).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_parse_sensor_data_bad_timestamp() {
        let err = parse_sensor_data(r#"{"Data":[{"x":"yesterday","y":1.0}]}"#, 7).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_build_urls_from_builtin_templates() {
        let source = Config::load_default().unwrap().source;
        assert_eq!(
            build_sensor_list_url(&source, 3),
            "http://krasecology.ru/Main/GetAirSensorList/3"
        );
        assert_eq!(
            build_sensor_data_url(&source, "337", Interval::Week),
            "http://krasecology.ru/Main/GetAirSensorData/337?timelap=week"
        );
    }
}

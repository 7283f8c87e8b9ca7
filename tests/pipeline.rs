//! Fetch-pipeline behavior against an in-memory upstream network: failure
//! isolation per station and per sensor, parameter-code filtering, and the
//! abort-on-station-list contract.

use aeris::{
    fetch_all_readings, FetchError, Sensor, SensorParam, SensorValue, SensorValues,
    StationSummary, UpstreamApi,
};
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct FakeUpstream {
    stations: Vec<i64>,
    sensors: HashMap<String, Vec<Sensor>>,
    values: HashMap<i64, Vec<SensorValue>>,
    fail_station_list: bool,
    failing_stations: HashSet<String>,
    failing_sensors: HashSet<i64>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeUpstream {
    fn with_station(mut self, station_id: i64) -> Self {
        self.stations.push(station_id);
        self.sensors.entry(station_id.to_string()).or_default();
        self
    }

    fn with_sensor(mut self, station_id: i64, sensor_id: i64, param_code: &str) -> Self {
        self.sensors
            .entry(station_id.to_string())
            .or_default()
            .push(Sensor {
                id: sensor_id,
                param: SensorParam { param_code: param_code.to_string() },
            });
        self
    }

    fn with_values(mut self, sensor_id: i64, values: &[(&str, Option<f64>)]) -> Self {
        self.values.insert(
            sensor_id,
            values
                .iter()
                .map(|(date, value)| SensorValue { date: date.to_string(), value: *value })
                .collect(),
        );
        self
    }

    fn http_500(url: &str) -> FetchError {
        FetchError::HttpStatus {
            url: url.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    async fn track_concurrency(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl UpstreamApi for FakeUpstream {
    async fn fetch_stations(&self) -> Result<Vec<StationSummary>, FetchError> {
        if self.fail_station_list {
            return Err(Self::http_500("station/findAll"));
        }
        Ok(self.stations.iter().map(|&id| StationSummary { id }).collect())
    }

    async fn fetch_sensors(&self, station_id: &str) -> Result<Vec<Sensor>, FetchError> {
        self.track_concurrency().await;
        if self.failing_stations.contains(station_id) {
            return Err(Self::http_500(&format!("station/sensors/{station_id}")));
        }
        Ok(self.sensors.get(station_id).cloned().unwrap_or_default())
    }

    async fn fetch_values(&self, sensor_id: i64) -> Result<SensorValues, FetchError> {
        self.track_concurrency().await;
        if self.failing_sensors.contains(&sensor_id) {
            return Err(Self::http_500(&format!("data/getData/{sensor_id}")));
        }
        Ok(SensorValues {
            values: self.values.get(&sensor_id).cloned().unwrap_or_default(),
        })
    }
}

const T1: &str = "2025-06-01 10:00:00";
const T2: &str = "2025-06-01 11:00:00";

#[tokio::test]
async fn one_failing_station_leaves_the_rest_intact() {
    let mut fake = FakeUpstream::default()
        .with_station(1)
        .with_sensor(1, 11, "PM10")
        .with_values(11, &[(T1, Some(30.0))])
        .with_station(2)
        .with_sensor(2, 21, "PM2.5")
        .with_values(21, &[(T1, Some(12.5))])
        .with_station(3)
        .with_sensor(3, 31, "NO2")
        .with_values(31, &[(T1, Some(8.0))]);
    fake.failing_stations.insert("2".to_string());

    let outcome = fetch_all_readings(&fake, 8).await.expect("pass completes");
    assert_eq!(outcome.failed_stations, vec!["2".to_string()]);
    assert_eq!(outcome.readings.len(), 2);
    let stations: HashSet<&str> = outcome
        .readings
        .iter()
        .map(|r| r.station_id.as_str())
        .collect();
    assert_eq!(stations, HashSet::from(["1", "3"]));
}

#[tokio::test]
async fn one_failing_sensor_leaves_its_siblings_intact() {
    let mut fake = FakeUpstream::default()
        .with_station(1)
        .with_sensor(1, 11, "PM10")
        .with_values(11, &[(T1, Some(30.0))])
        .with_sensor(1, 12, "O3")
        .with_values(12, &[(T1, Some(60.0))]);
    fake.failing_sensors.insert(11);

    let outcome = fetch_all_readings(&fake, 8).await.expect("pass completes");
    assert_eq!(outcome.failed_sensors, vec![11]);
    assert_eq!(outcome.readings.len(), 1);
    assert_eq!(outcome.readings[0].o3, Some(60.0));
    assert!(outcome.failed_stations.is_empty());
}

#[tokio::test]
async fn station_list_failure_aborts_the_pass() {
    let fake = FakeUpstream {
        fail_station_list: true,
        ..FakeUpstream::default()
    };
    let result = fetch_all_readings(&fake, 8).await;
    assert!(matches!(result, Err(FetchError::HttpStatus { .. })));
}

#[tokio::test]
async fn unrecognized_parameter_code_yields_no_readings() {
    let fake = FakeUpstream::default()
        .with_station(1)
        .with_sensor(1, 11, "xyz")
        .with_values(11, &[(T1, Some(99.0))]);

    let outcome = fetch_all_readings(&fake, 8).await.expect("pass completes");
    assert!(outcome.readings.is_empty());
    assert!(outcome.failed_stations.is_empty());
    assert!(outcome.failed_sensors.is_empty());
}

#[tokio::test]
async fn null_measurements_are_dropped_and_codes_map_to_fields() {
    let fake = FakeUpstream::default()
        .with_station(7)
        .with_sensor(7, 71, "PM2.5")
        .with_values(71, &[(T1, Some(12.5)), (T2, None)])
        .with_sensor(7, 72, "C6H6")
        .with_values(72, &[(T1, Some(0.8))]);

    let mut outcome = fetch_all_readings(&fake, 8).await.expect("pass completes");
    outcome.readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    assert_eq!(outcome.readings.len(), 2);
    for reading in &outcome.readings {
        assert_eq!(reading.station_id, "7");
        assert_eq!(reading.timestamp, T1);
    }
    let pm25: Vec<f64> = outcome.readings.iter().filter_map(|r| r.pm25).collect();
    let benzene: Vec<f64> = outcome.readings.iter().filter_map(|r| r.benzene).collect();
    assert_eq!(pm25, vec![12.5]);
    assert_eq!(benzene, vec![0.8]);
}

#[tokio::test]
async fn empty_station_list_completes_with_nothing() {
    let fake = FakeUpstream::default();
    let outcome = fetch_all_readings(&fake, 8).await.expect("pass completes");
    assert!(outcome.readings.is_empty());
}

#[tokio::test]
async fn fan_out_respects_the_concurrency_bound() {
    let mut fake = FakeUpstream::default();
    for station in 0..40 {
        fake = fake
            .with_station(station)
            .with_sensor(station, station * 100, "PM10")
            .with_values(station * 100, &[(T1, Some(1.0))]);
    }
    let max_in_flight = Arc::clone(&fake.max_in_flight);

    let outcome = fetch_all_readings(&fake, 4).await.expect("pass completes");
    assert_eq!(outcome.readings.len(), 40);
    assert!(
        max_in_flight.load(Ordering::SeqCst) <= 4,
        "saw {} concurrent upstream calls",
        max_in_flight.load(Ordering::SeqCst)
    );
}

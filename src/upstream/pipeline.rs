//! The fetch pipeline: one pass over the whole upstream network.
//!
//! Stage one fans out over stations to discover sensors; stage two fans out
//! over the flattened sensor list to pull readings. The stages are
//! sequential, each is internally concurrent up to the configured bound,
//! and a failure of any single station or sensor is isolated: it is logged,
//! recorded in the outcome, and contributes nothing. Only a failure to get
//! the station list itself aborts the pass.

use crate::model::Reading;
use crate::upstream::api::{Sensor, UpstreamApi};
use crate::upstream::error::FetchError;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};

/// Upstream parameter codes (lowercased) and the canonical field each maps
/// to. Sensors with any other code produce no readings.
pub const PARAM_FIELDS: [(&str, &str); 7] = [
    ("pm10", "pm10"),
    ("pm2.5", "pm25"),
    ("no2", "no2"),
    ("so2", "so2"),
    ("o3", "o3"),
    ("co", "co"),
    ("c6h6", "benzene"),
];

/// Canonical field name for an upstream parameter code, if recognized.
pub fn canonical_field(param_code: &str) -> Option<&'static str> {
    let code = param_code.to_ascii_lowercase();
    PARAM_FIELDS
        .iter()
        .find(|(upstream, _)| *upstream == code)
        .map(|(_, field)| *field)
}

/// Result of one pipeline pass: the gathered readings plus the units that
/// failed and were skipped. Reading order is not meaningful.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub readings: Vec<Reading>,
    pub failed_stations: Vec<String>,
    pub failed_sensors: Vec<i64>,
}

/// Runs one full fetch pass. `concurrency` bounds the in-flight requests of
/// each fan-out stage.
pub async fn fetch_all_readings<A: UpstreamApi + Sync>(
    api: &A,
    concurrency: usize,
) -> Result<FetchOutcome, FetchError> {
    let concurrency = concurrency.max(1);
    let stations = api.fetch_stations().await?;
    info!("fetch pass: {} stations listed", stations.len());

    // Stage one: sensor discovery per station.
    let station_ids: Vec<String> = stations.iter().map(|station| station.id.to_string()).collect();
    let sensor_lists: Vec<(String, Result<Vec<Sensor>, FetchError>)> =
        stream::iter(station_ids.into_iter().map(|station_id| async move {
            let result = api.fetch_sensors(&station_id).await;
            (station_id, result)
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut outcome = FetchOutcome::default();
    let mut sensors: Vec<(String, Sensor)> = Vec::new();
    for (station_id, result) in sensor_lists {
        match result {
            Ok(list) => {
                for sensor in list {
                    sensors.push((station_id.clone(), sensor));
                }
            }
            Err(e) => {
                warn!("skipping station {}: {}", station_id, e);
                outcome.failed_stations.push(station_id);
            }
        }
    }

    // Sensors with an unrecognized parameter code yield nothing; skip them
    // before spending requests on their values.
    sensors.retain(|(station_id, sensor)| {
        let recognized = canonical_field(&sensor.param.param_code).is_some();
        if !recognized {
            debug!(
                "ignoring sensor {} on station {}: unknown parameter code '{}'",
                sensor.id, station_id, sensor.param.param_code
            );
        }
        recognized
    });

    // Stage two: readings per sensor.
    let value_lists: Vec<(String, Sensor, Result<Vec<Reading>, FetchError>)> =
        stream::iter(sensors.into_iter().map(|(station_id, sensor)| async move {
            let result = fetch_sensor_readings(api, &station_id, &sensor).await;
            (station_id, sensor, result)
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

    for (station_id, sensor, result) in value_lists {
        match result {
            Ok(readings) => outcome.readings.extend(readings),
            Err(e) => {
                warn!("skipping sensor {} on station {}: {}", sensor.id, station_id, e);
                outcome.failed_sensors.push(sensor.id);
            }
        }
    }

    info!(
        "fetch pass complete: {} readings, {} stations failed, {} sensors failed",
        outcome.readings.len(),
        outcome.failed_stations.len(),
        outcome.failed_sensors.len()
    );
    Ok(outcome)
}

async fn fetch_sensor_readings<A: UpstreamApi>(
    api: &A,
    station_id: &str,
    sensor: &Sensor,
) -> Result<Vec<Reading>, FetchError> {
    // Callers only hand us recognized sensors; re-resolving keeps this
    // function total on its own.
    let Some(field) = canonical_field(&sensor.param.param_code) else {
        return Ok(Vec::new());
    };
    let series = api.fetch_values(sensor.id).await?;
    let mut readings = Vec::new();
    for value in series.values {
        let Some(measured) = value.value else { continue };
        let mut reading = Reading::new(station_id, value.date);
        reading.set_field(field, measured);
        readings.push(reading);
    }
    Ok(readings)
}

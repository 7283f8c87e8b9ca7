//! Typed schemas for the upstream air-quality network's REST endpoints and
//! the reqwest-backed client that calls them.

use crate::upstream::error::FetchError;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;

/// One entry of the network-wide station list (`/station/findAll`).
#[derive(Debug, Clone, Deserialize)]
pub struct StationSummary {
    pub id: i64,
}

/// One sensor attached to a station (`/station/sensors/{id}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: i64,
    pub param: SensorParam,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorParam {
    pub param_code: String,
}

/// Time series of one sensor (`/data/getData/{sensorId}`).
#[derive(Debug, Clone, Deserialize)]
pub struct SensorValues {
    #[serde(default)]
    pub values: Vec<SensorValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorValue {
    pub date: String,
    pub value: Option<f64>,
}

/// The three upstream calls the pipeline fans out over. The seam exists so
/// the pipeline can run against an in-memory network in tests.
pub trait UpstreamApi {
    fn fetch_stations(&self) -> impl Future<Output = Result<Vec<StationSummary>, FetchError>> + Send;

    fn fetch_sensors(
        &self,
        station_id: &str,
    ) -> impl Future<Output = Result<Vec<Sensor>, FetchError>> + Send;

    fn fetch_values(
        &self,
        sensor_id: i64,
    ) -> impl Future<Output = Result<SensorValues, FetchError>> + Send;
}

/// HTTP client for the real upstream API. Cheap to clone; all clones share
/// the process-wide connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, http: Client) -> UpstreamClient {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        UpstreamClient { http, base_url }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus { url, status });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(url, e))
    }
}

impl UpstreamApi for UpstreamClient {
    async fn fetch_stations(&self) -> Result<Vec<StationSummary>, FetchError> {
        self.get_json("station/findAll").await
    }

    async fn fetch_sensors(&self, station_id: &str) -> Result<Vec<Sensor>, FetchError> {
        self.get_json(&format!("station/sensors/{}", station_id)).await
    }

    async fn fetch_values(&self, sensor_id: i64) -> Result<SensorValues, FetchError> {
        self.get_json(&format!("data/getData/{}", sensor_id)).await
    }
}

//! The main entry point of the subsystem: one explicitly constructed
//! context object owning the HTTP session, the store client and the
//! upstream client, exposing the ingestion and query operations the web
//! API layer calls.

use crate::config::Config;
use crate::error::AirQualityError;
use crate::model::{AirQualityRow, Reading, Source, UserStation};
use crate::normalize::{reading_to_point, readings_to_points, user_station_to_point};
use crate::query::{flux, rows, ReadingsRequest};
use crate::scheduler::Scheduler;
use crate::store::InfluxClient;
use crate::upstream::{fetch_all_readings, UpstreamClient};
use bon::bon;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::Arc;

/// Counts from one completed fetch-and-save pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    /// Readings gathered from the upstream network.
    pub fetched: usize,
    /// Points that passed normalization and were written.
    pub written: usize,
    /// Stations whose sensor discovery failed and was skipped.
    pub failed_stations: usize,
    /// Sensors whose value fetch failed and was skipped.
    pub failed_sensors: usize,
}

/// Air-quality ingestion and query service.
///
/// Construct once at startup with [`AirQuality::builder`] and share behind
/// an [`Arc`]; every clone of the inner clients reuses the same connection
/// pool. Query operations degrade to empty results on store failure (the
/// failure is logged); write operations propagate store failures to the
/// caller.
#[derive(Debug)]
pub struct AirQuality {
    store: InfluxClient,
    upstream: UpstreamClient,
    config: Config,
}

#[bon]
impl AirQuality {
    /// Builds the service from its configuration. A pre-configured
    /// `http_client` can be supplied (tests, custom TLS); by default one is
    /// built with the configured per-request timeout.
    #[builder]
    pub fn new(config: Config, http_client: Option<reqwest::Client>) -> Result<Self, AirQualityError> {
        let http = match http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .map_err(AirQualityError::HttpClient)?,
        };
        let store = InfluxClient::new(&config.influx, http.clone());
        let upstream = UpstreamClient::new(config.upstream.base_url.clone(), http);
        Ok(AirQuality { store, upstream, config })
    }

    /// Aggregated readings for the requested window. Client-input errors
    /// (malformed dates, start after end, bad window) are returned;
    /// a store-level query failure degrades to an empty result.
    pub async fn fetch_readings(
        &self,
        request: &ReadingsRequest,
    ) -> Result<Vec<AirQualityRow>, AirQualityError> {
        let window = request.resolve(Utc::now().date_naive())?;
        let query = flux::readings_query(self.store.bucket(), request, &window);
        match self.store.query(&query).await {
            Ok(tables) => Ok(rows::readings_rows(&tables)),
            Err(e) => {
                error!("readings query failed: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Distinct station ids seen in the store recently. Empty on store
    /// failure.
    pub async fn list_stations(&self, source: Option<Source>) -> Vec<String> {
        let query = flux::stations_query(self.store.bucket(), source);
        match self.store.query(&query).await {
            Ok(tables) => rows::station_ids(&tables),
            Err(e) => {
                error!("station discovery query failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Earliest and latest recorded timestamps within the lookback window.
    /// `None` unless both bounds exist, and `None` on store failure.
    pub async fn time_range(
        &self,
        source: Option<Source>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let bucket = self.store.bucket();
        let run = |query: String| async move {
            match self.store.query(&query).await {
                Ok(tables) => Some(tables),
                Err(e) => {
                    error!("time range query failed: {}", e);
                    None
                }
            }
        };
        let earliest = run(flux::time_bound_query(bucket, source, false)).await?;
        let latest = run(flux::time_bound_query(bucket, source, true)).await?;
        rows::time_range(&earliest, &latest)
    }

    /// Writes one user-submitted reading. The source tag is forced to
    /// [`Source::UserSubmitted`] regardless of what the payload claimed.
    pub async fn record_user_reading(&self, mut reading: Reading) -> Result<(), AirQualityError> {
        reading.source = Source::UserSubmitted;
        let point = reading_to_point(&reading)?;
        self.store.write(&[point]).await?;
        Ok(())
    }

    /// Registers or updates a user station's coordinates. The new version
    /// is stamped with the current instant and becomes authoritative.
    pub async fn upsert_user_station(
        &self,
        station_id: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Result<(), AirQualityError> {
        let station = UserStation { station_id: station_id.into(), lat, lon };
        let point = user_station_to_point(&station, Utc::now());
        self.store.write(&[point]).await?;
        Ok(())
    }

    /// Current metadata of every fully-configured user station. Empty on
    /// store failure.
    pub async fn list_user_stations(&self) -> Vec<UserStation> {
        let query = flux::user_stations_query(self.store.bucket());
        match self.store.query(&query).await {
            Ok(tables) => rows::user_stations(&tables),
            Err(e) => {
                error!("user station query failed: {}", e);
                Vec::new()
            }
        }
    }

    /// One full ingestion pass: pulls the current readings from the
    /// upstream network, normalizes them and writes them. A failed station
    /// list aborts the pass; store write failures propagate. An empty pass
    /// is not an error, just a log line.
    pub async fn fetch_and_save(&self) -> Result<FetchReport, AirQualityError> {
        let outcome = fetch_all_readings(&self.upstream, self.config.fetch_concurrency).await?;
        let points = readings_to_points(&outcome.readings);
        let report = FetchReport {
            fetched: outcome.readings.len(),
            written: points.len(),
            failed_stations: outcome.failed_stations.len(),
            failed_sensors: outcome.failed_sensors.len(),
        };
        if points.is_empty() {
            warn!("fetch pass produced no writable readings");
            return Ok(report);
        }
        self.store.write(&points).await?;
        info!(
            "fetch pass saved {} points ({} readings fetched, {} stations / {} sensors skipped)",
            report.written, report.fetched, report.failed_stations, report.failed_sensors
        );
        Ok(report)
    }

    /// Starts the recurring background ingestion on the configured
    /// interval: one pass immediately, then one per tick. The returned
    /// handle stops it.
    pub fn schedule_fetch(self: Arc<Self>) -> Scheduler {
        let service = self;
        Scheduler::spawn(service.config.fetch_interval, move || {
            let service = Arc::clone(&service);
            async move { service.fetch_and_save().await.map(|_| ()) }
        })
    }
}

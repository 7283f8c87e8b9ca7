//! Client for the external time-series store (InfluxDB v2 HTTP API):
//! line-protocol point writes and Flux queries returning annotated-CSV
//! result tables.

mod client;
mod error;
mod flux;
mod point;

pub use client::InfluxClient;
pub use error::StoreError;
pub use flux::{parse_annotated_csv, FluxRecord, FluxTable};
pub use point::Point;

/// Measurement holding all pollutant readings.
pub const READINGS_MEASUREMENT: &str = "air-quality";

/// Measurement holding versioned user-station metadata.
pub const STATION_METADATA_MEASUREMENT: &str = "station-metadata";

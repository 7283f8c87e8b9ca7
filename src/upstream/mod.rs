//! Upstream air-quality network: endpoint schemas, HTTP client and the
//! concurrent fetch pipeline.

mod api;
mod error;
mod pipeline;

pub use api::{Sensor, SensorParam, SensorValue, SensorValues, StationSummary, UpstreamApi, UpstreamClient};
pub use error::FetchError;
pub use pipeline::{canonical_field, fetch_all_readings, FetchOutcome, PARAM_FIELDS};

mod config;
mod error;
mod model;
mod normalize;
mod query;
mod scheduler;
mod service;
mod store;
mod upstream;

pub use error::AirQualityError;
pub use service::*;

pub use config::{Config, ConfigError, InfluxConfig, UpstreamConfig, DEFAULT_UPSTREAM_URL};
pub use model::{AirQualityRow, Reading, Source, UserStation, POLLUTANT_FIELDS};
pub use normalize::{reading_to_point, readings_to_points, user_station_to_point, NormalizeError};
pub use query::{flux, rows, QueryError, ReadingsRequest, ReadingsWindow};
pub use scheduler::Scheduler;
pub use store::{
    parse_annotated_csv, FluxRecord, FluxTable, InfluxClient, Point, StoreError,
    READINGS_MEASUREMENT, STATION_METADATA_MEASUREMENT,
};
pub use upstream::{
    canonical_field, fetch_all_readings, FetchError, FetchOutcome, Sensor, SensorParam,
    SensorValue, SensorValues, StationSummary, UpstreamApi, UpstreamClient, PARAM_FIELDS,
};

//! Reshapes store result tables into the tabular records the API layer
//! returns.

use crate::model::{AirQualityRow, Source, UserStation, POLLUTANT_FIELDS};
use crate::store::FluxTable;
use chrono::{DateTime, SecondsFormat, Utc};

/// Pivoted readings records → output rows. Records without a station id or
/// timestamp are bookkeeping noise and skipped.
pub fn readings_rows(tables: &[FluxTable]) -> Vec<AirQualityRow> {
    let mut rows = Vec::new();
    for table in tables {
        for record in &table.records {
            let Some(station_id) = record.get("station_id") else {
                continue;
            };
            let Some(time) = record.time("_time") else {
                continue;
            };
            let source = record
                .get("source")
                .and_then(Source::from_wire)
                .unwrap_or_default();
            let mut row = AirQualityRow::empty(
                station_id.to_string(),
                time.to_rfc3339_opts(SecondsFormat::Secs, true),
                source,
            );
            for field in POLLUTANT_FIELDS {
                if let Some(value) = record.f64(field) {
                    row.set_field(field, value);
                }
            }
            rows.push(row);
        }
    }
    rows
}

/// Station-discovery records → sorted, de-duplicated id set.
pub fn station_ids(tables: &[FluxTable]) -> Vec<String> {
    let mut ids: Vec<String> = tables
        .iter()
        .flat_map(|table| &table.records)
        .filter_map(|record| record.get("_value"))
        .map(str::to_string)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// The single timestamp of a time-bound query, if any row came back.
pub fn time_bound(tables: &[FluxTable]) -> Option<DateTime<Utc>> {
    tables
        .iter()
        .flat_map(|table| &table.records)
        .find_map(|record| record.time("_time"))
}

/// Pairs the earliest- and latest-bound query results into the recorded
/// time range. Both bounds must be present; a half-filled pair counts as
/// no data.
pub fn time_range(
    earliest: &[FluxTable],
    latest: &[FluxTable],
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let min = time_bound(earliest)?;
    let max = time_bound(latest)?;
    Some((min, max))
}

/// Latest-version user-station records → stations with complete
/// coordinates. A station missing either coordinate is excluded.
pub fn user_stations(tables: &[FluxTable]) -> Vec<UserStation> {
    let mut stations: Vec<UserStation> = tables
        .iter()
        .flat_map(|table| &table.records)
        .filter_map(|record| {
            let station_id = record.get("station_id")?.to_string();
            let lat = record.f64("lat")?;
            let lon = record.f64("lon")?;
            Some(UserStation { station_id, lat, lon })
        })
        .collect();
    stations.sort_by(|a, b| a.station_id.cmp(&b.station_id));
    stations
}

//! Builders for the four Flux query shapes the subsystem issues. Pure
//! string construction; execution lives in the store client.

use crate::model::Source;
use crate::query::params::{ReadingsRequest, ReadingsWindow};
use crate::store::{READINGS_MEASUREMENT, STATION_METADATA_MEASUREMENT};

/// How far back station discovery looks.
const STATION_LOOKBACK: &str = "-48h";

/// How far back the time-range bounds look.
const TIME_RANGE_LOOKBACK: &str = "-30d";

/// Readings: day-boundary range, measurement + optional station/source
/// filters, mean aggregation per window with empty windows dropped, pivoted
/// to one row per timestamp and station.
pub fn readings_query(bucket: &str, request: &ReadingsRequest, window: &ReadingsWindow) -> String {
    let mut query = format!(
        "from(bucket: \"{}\")\n  |> range(start: {}T00:00:00Z, stop: {}T23:59:59Z)\n  |> filter(fn: (r) => r._measurement == \"{}\")\n",
        escape(bucket),
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d"),
        READINGS_MEASUREMENT,
    );
    if !request.station_ids.is_empty() {
        let conditions = request
            .station_ids
            .iter()
            .map(|id| format!("r[\"station_id\"] == \"{}\"", escape(id)))
            .collect::<Vec<_>>()
            .join(" or ");
        query.push_str(&format!("  |> filter(fn: (r) => {})\n", conditions));
    }
    if let Some(source) = request.source {
        query.push_str(&source_filter(source));
    }
    query.push_str(&format!(
        "  |> aggregateWindow(every: {}, fn: mean, createEmpty: false)\n  |> pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")\n  |> yield(name: \"mean\")\n",
        request.aggregation,
    ));
    query
}

/// Distinct station ids seen recently, optionally restricted to one source.
pub fn stations_query(bucket: &str, source: Option<Source>) -> String {
    let mut query = format!(
        "from(bucket: \"{}\")\n  |> range(start: {})\n  |> filter(fn: (r) => r._measurement == \"{}\")\n",
        escape(bucket),
        STATION_LOOKBACK,
        READINGS_MEASUREMENT,
    );
    if let Some(source) = source {
        query.push_str(&source_filter(source));
    }
    query.push_str(
        "  |> group(columns: [\"station_id\"])\n  |> distinct(column: \"station_id\")\n",
    );
    query
}

/// One bound of the recorded time range: the single earliest (`desc: false`)
/// or latest (`desc: true`) timestamp within the lookback window.
pub fn time_bound_query(bucket: &str, source: Option<Source>, latest: bool) -> String {
    let mut query = format!(
        "from(bucket: \"{}\")\n  |> range(start: {})\n  |> filter(fn: (r) => r._measurement == \"{}\")\n",
        escape(bucket),
        TIME_RANGE_LOOKBACK,
        READINGS_MEASUREMENT,
    );
    if let Some(source) = source {
        query.push_str(&source_filter(source));
    }
    query.push_str(&format!(
        "  |> keep(columns: [\"_time\"])\n  |> group(columns: [])\n  |> sort(columns: [\"_time\"], desc: {})\n  |> limit(n: 1)\n",
        latest,
    ));
    query
}

/// Latest metadata version per user station, pivoted to one row per station
/// with lat/lon columns.
pub fn user_stations_query(bucket: &str) -> String {
    format!(
        "from(bucket: \"{}\")\n  |> range(start: 0)\n  |> filter(fn: (r) => r._measurement == \"{}\")\n  |> last()\n  |> pivot(rowKey: [\"station_id\"], columnKey: [\"_field\"], valueColumn: \"_value\")\n",
        escape(bucket),
        STATION_METADATA_MEASUREMENT,
    )
}

fn source_filter(source: Source) -> String {
    format!("  |> filter(fn: (r) => r[\"source\"] == \"{}\")\n", source.as_str())
}

// Station ids and bucket names land inside Flux string literals.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

//! Turns heterogeneous reading payloads into canonical store points.
//!
//! Readings become points in the "air-quality" measurement tagged with
//! station and source; null or absent pollutants are dropped, never written
//! as zero. User-station metadata becomes points in "station-metadata",
//! stamped with the processing time so that the most recent write wins.

use crate::model::{Reading, UserStation};
use crate::store::{Point, READINGS_MEASUREMENT, STATION_METADATA_MEASUREMENT};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Reading is missing a station id")]
    MissingStationId,

    #[error("Reading has an unparseable timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Reading for station '{0}' has no pollutant fields")]
    NoFields(String),

    #[error("Negative value {value} for field '{field}' on station '{station_id}'")]
    NegativeValue {
        station_id: String,
        field: &'static str,
        value: f64,
    },
}

/// Converts one reading into a writable point.
///
/// Rejects readings without a station id, with a timestamp that does not
/// parse to an instant, with a negative pollutant value, or with no present
/// pollutant at all (an empty point is never written).
pub fn reading_to_point(reading: &Reading) -> Result<Point, NormalizeError> {
    if reading.station_id.is_empty() {
        return Err(NormalizeError::MissingStationId);
    }
    let timestamp = parse_timestamp(&reading.timestamp)
        .ok_or_else(|| NormalizeError::InvalidTimestamp(reading.timestamp.clone()))?;

    let mut point = Point::new(READINGS_MEASUREMENT, timestamp)
        .tag("station_id", reading.station_id.clone())
        .tag("source", reading.source.as_str());

    for (field, value) in reading.fields() {
        let Some(value) = value else { continue };
        if value < 0.0 {
            return Err(NormalizeError::NegativeValue {
                station_id: reading.station_id.clone(),
                field,
                value,
            });
        }
        point = point.field(field, value);
    }

    if point.field_count() == 0 {
        return Err(NormalizeError::NoFields(reading.station_id.clone()));
    }
    Ok(point)
}

/// Batch conversion with the pipeline's drop policy: rejects are logged and
/// skipped, everything else is returned in input order.
pub fn readings_to_points(readings: &[Reading]) -> Vec<Point> {
    let mut points = Vec::with_capacity(readings.len());
    for reading in readings {
        match reading_to_point(reading) {
            Ok(point) => points.push(point),
            Err(e) => warn!("dropping reading: {}", e),
        }
    }
    points
}

/// Converts a user station's metadata into its versioned point. The
/// timestamp is the supplied processing instant, not an observation time;
/// the latest version by this timestamp is the authoritative one.
pub fn user_station_to_point(station: &UserStation, now: DateTime<Utc>) -> Point {
    Point::new(STATION_METADATA_MEASUREMENT, now)
        .tag("station_id", station.station_id.clone())
        .field("lat", station.lat)
        .field("lon", station.lon)
}

// Accepts RFC 3339 as well as the zone-less "YYYY-MM-DD HH:MM:SS" shape the
// upstream network emits (taken as UTC), with or without a 'T' separator.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_reading_with_no_fields() {
        let reading = Reading::new("117", "2025-06-01T10:00:00Z");
        assert!(matches!(
            reading_to_point(&reading),
            Err(NormalizeError::NoFields(_))
        ));
    }

    #[test]
    fn rejects_missing_station_id_and_bad_timestamp() {
        let mut reading = Reading::new("", "2025-06-01T10:00:00Z");
        reading.set_field("pm25", 1.0);
        assert!(matches!(
            reading_to_point(&reading),
            Err(NormalizeError::MissingStationId)
        ));

        let mut reading = Reading::new("117", "first of June");
        reading.set_field("pm25", 1.0);
        assert!(matches!(
            reading_to_point(&reading),
            Err(NormalizeError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn rejects_negative_values() {
        let mut reading = Reading::new("117", "2025-06-01T10:00:00Z");
        reading.set_field("so2", -0.4);
        assert!(matches!(
            reading_to_point(&reading),
            Err(NormalizeError::NegativeValue { field: "so2", .. })
        ));
    }

    #[test]
    fn absent_fields_are_omitted_from_the_point() {
        let mut reading = Reading::new("117", "2025-06-01 10:00:00");
        reading.set_field("pm25", 12.3);
        reading.set_field("o3", 60.0);
        let point = reading_to_point(&reading).expect("writable");
        assert_eq!(point.field_count(), 2);
        let line = point.to_line_protocol().expect("has fields");
        assert!(line.contains("pm25=12.3"));
        assert!(line.contains("o3=60"));
        assert!(!line.contains("pm10"));
        assert!(line.contains("source=external-sensor-network"));
    }

    #[test]
    fn upstream_timestamp_shape_is_taken_as_utc() {
        let mut reading = Reading::new("117", "2025-06-01 10:00:00");
        reading.set_field("co", 0.2);
        let point = reading_to_point(&reading).expect("writable");
        assert_eq!(
            point.timestamp(),
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn batch_conversion_drops_rejects_and_keeps_the_rest() {
        let mut good = Reading::new("117", "2025-06-01T10:00:00Z");
        good.set_field("pm10", 30.0);
        let empty = Reading::new("205", "2025-06-01T10:00:00Z");
        let points = readings_to_points(&[good, empty]);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn station_metadata_uses_processing_time() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap();
        let station = UserStation {
            station_id: "backyard-1".to_string(),
            lat: 52.2297,
            lon: 21.0122,
        };
        let point = user_station_to_point(&station, now);
        assert_eq!(point.timestamp(), now);
        let line = point.to_line_protocol().expect("has fields");
        assert!(line.starts_with("station-metadata,station_id=backyard-1 "));
        assert!(line.contains("lat=52.2297"));
        assert!(line.contains("lon=21.0122"));
    }
}

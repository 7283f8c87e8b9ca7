//! Core data model: readings, their provenance, user-registered stations and
//! the tabular rows returned by the readings query.

use serde::{Deserialize, Serialize};

/// Provenance of a reading: pulled from the external sensor network, or
/// submitted by a user through the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Source {
    #[default]
    #[serde(rename = "external-sensor-network")]
    ExternalSensorNetwork,
    #[serde(rename = "user-submitted")]
    UserSubmitted,
}

impl Source {
    /// The tag value written to / matched against the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::ExternalSensorNetwork => "external-sensor-network",
            Source::UserSubmitted => "user-submitted",
        }
    }

    /// Parses a tag value coming back from the store.
    pub fn from_wire(value: &str) -> Option<Source> {
        match value {
            "external-sensor-network" => Some(Source::ExternalSensorNetwork),
            "user-submitted" => Some(Source::UserSubmitted),
            _ => None,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical field names of the seven tracked pollutants, in write order.
pub const POLLUTANT_FIELDS: [&str; 7] = ["pm25", "pm10", "no2", "so2", "o3", "co", "benzene"];

/// One measurement event for a station.
///
/// `timestamp` is kept as the ISO-8601 string it arrived with; the normalizer
/// parses it when turning the reading into a store point. Absent pollutants
/// stay `None` and are never written as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub station_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub so2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benzene: Option<f64>,
}

impl Reading {
    /// A reading with no pollutant fields set yet.
    pub fn new(station_id: impl Into<String>, timestamp: impl Into<String>) -> Reading {
        Reading {
            station_id: station_id.into(),
            timestamp: timestamp.into(),
            source: Source::default(),
            pm25: None,
            pm10: None,
            no2: None,
            so2: None,
            o3: None,
            co: None,
            benzene: None,
        }
    }

    /// All pollutant fields, present or not, paired with their canonical name.
    pub fn fields(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("pm25", self.pm25),
            ("pm10", self.pm10),
            ("no2", self.no2),
            ("so2", self.so2),
            ("o3", self.o3),
            ("co", self.co),
            ("benzene", self.benzene),
        ]
    }

    /// Sets a pollutant by canonical field name. Returns `false` for an
    /// unknown name, leaving the reading untouched.
    pub fn set_field(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "pm25" => &mut self.pm25,
            "pm10" => &mut self.pm10,
            "no2" => &mut self.no2,
            "so2" => &mut self.so2,
            "o3" => &mut self.o3,
            "co" => &mut self.co,
            "benzene" => &mut self.benzene,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Whether at least one pollutant field is present.
    pub fn has_any_field(&self) -> bool {
        self.fields().iter().any(|(_, v)| v.is_some())
    }
}

/// A user-registered station's current metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStation {
    pub station_id: String,
    pub lat: f64,
    pub lon: f64,
}

/// One output row of the readings query: a timestamp/station pair with a
/// column per aggregated pollutant. Empty aggregation windows never produce
/// a row, so at least one pollutant column is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityRow {
    pub station_id: String,
    pub timestamp: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub so2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benzene: Option<f64>,
}

impl AirQualityRow {
    pub(crate) fn empty(station_id: String, timestamp: String, source: Source) -> AirQualityRow {
        AirQualityRow {
            station_id,
            timestamp,
            source,
            pm25: None,
            pm10: None,
            no2: None,
            so2: None,
            o3: None,
            co: None,
            benzene: None,
        }
    }

    pub(crate) fn set_field(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "pm25" => &mut self.pm25,
            "pm10" => &mut self.pm10,
            "no2" => &mut self.no2,
            "so2" => &mut self.so2,
            "o3" => &mut self.o3,
            "co" => &mut self.co,
            "benzene" => &mut self.benzene,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

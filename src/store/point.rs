use chrono::{DateTime, Utc};

/// One immutable time-series write: measurement name, tag set, float fields
/// and a timestamp.
///
/// Rendering follows the InfluxDB line protocol. Tags are sorted by key at
/// render time and all special characters are escaped, so arbitrary station
/// ids are safe to carry as tag values.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: &'static str,
    tags: Vec<(&'static str, String)>,
    fields: Vec<(&'static str, f64)>,
    timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(measurement: &'static str, timestamp: DateTime<Utc>) -> Point {
        Point {
            measurement,
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp,
        }
    }

    pub fn tag(mut self, key: &'static str, value: impl Into<String>) -> Point {
        self.tags.push((key, value.into()));
        self
    }

    pub fn field(mut self, key: &'static str, value: f64) -> Point {
        self.fields.push((key, value));
        self
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Renders the point as one line of line protocol with a nanosecond
    /// timestamp. Returns `None` for a point without fields, which the
    /// protocol cannot represent; the normalizer never produces one.
    pub fn to_line_protocol(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }
        let mut line = escape_measurement(self.measurement);

        let mut tags = self.tags.clone();
        tags.sort_by_key(|(key, _)| *key);
        for (key, value) in &tags {
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }

        line.push(' ');
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&format_float(*value));
        }

        line.push(' ');
        // Nanosecond precision caps out in 2262; clamp rather than panic.
        let nanos = self.timestamp.timestamp_nanos_opt().unwrap_or(i64::MAX);
        line.push_str(&nanos.to_string());
        Some(line)
    }
}

fn escape_measurement(name: &str) -> String {
    name.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn format_float(value: f64) -> String {
    // {} on f64 always includes enough digits to round-trip, and renders
    // integral values without an exponent.
    format!("{}", value)
}

//! Typed, validated parameters for the readings query.

use crate::model::Source;
use crate::query::error::QueryError;
use bon::Builder;
use chrono::NaiveDate;

/// Default lower bound of the readings window when no start date is given:
/// the epoch of the deployed system, predating all recorded data.
const DEFAULT_START: &str = "2025-01-01";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parameters of a readings query, as they arrive from the API layer.
///
/// Dates are inclusive calendar dates as `YYYY-MM-DD` strings; resolution
/// and validation happen in [`ReadingsRequest::resolve`].
#[derive(Debug, Clone, Builder)]
pub struct ReadingsRequest {
    /// Station ids to include, OR-combined. Empty means all stations.
    #[builder(default, into)]
    pub station_ids: Vec<String>,
    #[builder(into)]
    pub start_date: Option<String>,
    #[builder(into)]
    pub end_date: Option<String>,
    /// Aggregation window, e.g. "1h" or "1d".
    #[builder(default = "1h".to_string(), into)]
    pub aggregation: String,
    pub source: Option<Source>,
}

/// A fully-validated readings window, ready to render into a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingsWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReadingsRequest {
    /// Validates dates and the aggregation window. `today` supplies the
    /// default end date (the current UTC date at the call site).
    pub fn resolve(&self, today: NaiveDate) -> Result<ReadingsWindow, QueryError> {
        let start = match &self.start_date {
            Some(raw) => parse_date(raw)?,
            None => NaiveDate::parse_from_str(DEFAULT_START, DATE_FORMAT)
                .unwrap_or(NaiveDate::MIN),
        };
        let end = match &self.end_date {
            Some(raw) => parse_date(raw)?,
            None => today,
        };
        if start > end {
            return Err(QueryError::InvalidRange { start, end });
        }
        if !is_valid_window(&self.aggregation) {
            return Err(QueryError::BadAggregation(self.aggregation.clone()));
        }
        Ok(ReadingsWindow { start, end })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| QueryError::BadDate(raw.to_string()))
}

// The window string is interpolated into the query text, so only the plain
// <digits><unit> duration shape is allowed through.
fn is_valid_window(window: &str) -> bool {
    let Some(unit) = window.chars().last() else {
        return false;
    };
    if !matches!(unit, 's' | 'm' | 'h' | 'd' | 'w') {
        return false;
    }
    let digits = &window[..window.len() - 1];
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

use chrono::NaiveDate;
use thiserror::Error;

/// Client-input errors: rejected before any store traffic and never
/// silently corrected.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    BadDate(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid aggregation window '{0}': expected a duration like \"1h\" or \"1d\"")]
    BadAggregation(String),
}

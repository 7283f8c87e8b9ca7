//! Reader for the annotated-CSV shape the store returns from Flux queries.
//!
//! A response is a sequence of result blocks. Each block starts with
//! annotation rows (`#group`, `#datatype`, `#default`), then a header row,
//! then data rows; blocks are separated by blank lines. Every row begins
//! with an empty annotation column. A new header row starts a new table.

use crate::store::error::StoreError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One result table: the records that shared a header row.
#[derive(Debug, Clone, Default)]
pub struct FluxTable {
    pub records: Vec<FluxRecord>,
}

/// One result row, with raw column values keyed by column name.
#[derive(Debug, Clone)]
pub struct FluxRecord {
    values: HashMap<String, String>,
}

impl FluxRecord {
    /// Raw column value; `None` when the column is absent or empty.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(|v| v.parse().ok())
    }

    pub fn time(&self, column: &str) -> Option<DateTime<Utc>> {
        self.get(column)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// Column names of this record, in arbitrary order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Parses an annotated-CSV query response into result tables.
pub fn parse_annotated_csv(body: &str) -> Result<Vec<FluxTable>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(body.as_bytes());

    let mut tables: Vec<FluxTable> = Vec::new();
    let mut header: Vec<String> = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|v| v.is_empty()) {
            continue;
        }
        if is_header(&record) {
            header = record.iter().map(str::to_string).collect();
            tables.push(FluxTable::default());
            continue;
        }
        if header.is_empty() {
            // Data before any header; nothing to key the columns by.
            continue;
        }
        let values = header
            .iter()
            .zip(record.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        if let Some(table) = tables.last_mut() {
            table.records.push(FluxRecord { values });
        }
    }
    Ok(tables)
}

// Header rows repeat the bookkeeping column names; data rows carry a number
// in the `table` position.
fn is_header(record: &csv::StringRecord) -> bool {
    record.get(1) == Some("result") && record.get(2) == Some("table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PIVOTED: &str = "\
#group,false,false,true,true,false,true,true,false,false
#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,string,string,double,double
#default,mean,,,,,,,,
,result,table,_start,_stop,_time,_measurement,station_id,pm25,pm10
,,0,2025-06-01T00:00:00Z,2025-06-02T23:59:59Z,2025-06-01T10:00:00Z,air-quality,117,12.3,30.1
,,0,2025-06-01T00:00:00Z,2025-06-02T23:59:59Z,2025-06-01T11:00:00Z,air-quality,117,13.1,
";

    #[test]
    fn parses_pivoted_block() {
        let tables = parse_annotated_csv(PIVOTED).expect("parses");
        assert_eq!(tables.len(), 1);
        let records = &tables[0].records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("station_id"), Some("117"));
        assert_eq!(records[0].f64("pm25"), Some(12.3));
        assert_eq!(
            records[0].time("_time"),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap())
        );
        // Empty cell reads as absent, not as zero.
        assert_eq!(records[1].f64("pm10"), None);
    }

    #[test]
    fn splits_blocks_into_tables() {
        let body = "\
,result,table,_value
,,0,117

,result,table,_value
,,1,205
";
        let tables = parse_annotated_csv(body).expect("parses");
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].records[0].get("_value"), Some("117"));
        assert_eq!(tables[1].records[0].get("_value"), Some("205"));
    }

    #[test]
    fn empty_body_yields_no_tables() {
        let tables = parse_annotated_csv("\r\n\r\n").expect("parses");
        assert!(tables.is_empty());
    }
}

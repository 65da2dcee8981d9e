/*
Copyright 2026 the clmforc developers

This file is part of the CLM Single-Point Forcing Builder (clmforc).

clmforc is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

clmforc is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with clmforc. If not, see https://www.gnu.org/licenses/.
*/

//! Module responsible for loading the station observation table
//! into a UTC-indexed, read-only record.
//!
//! The table is read once per run and shared by all monthly
//! partitions. Missing-value codes are normalized to NaN here so the
//! rest of the pipeline only deals with floats.

use crate::builder::configuration::Input;
use crate::errors::LoadError;
use crate::Float;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rustc_hash::FxHashMap;
use std::io::Read;

/// Time-indexed observation record.
///
/// The index is monotonically non-decreasing and time zone-aware.
/// Naive timestamps in the table are taken to already represent UTC,
/// which is documented site metadata and not auto-detected. Gaps in
/// the index are permitted; no fixed step is assumed.
#[derive(Clone, Debug)]
pub struct ObservationRecord {
    timestamps: Vec<DateTime<Utc>>,
    columns: FxHashMap<String, Vec<Float>>,
}

impl ObservationRecord {
    /// Reads the CSV table configured in the `input` section.
    pub fn new_from_csv(input: &Input) -> Result<Self, LoadError> {
        let reader = csv::Reader::from_path(&input.path)?;
        Self::from_csv_reader(reader, input)
    }

    fn from_csv_reader<R: Read>(
        mut reader: csv::Reader<R>,
        input: &Input,
    ) -> Result<Self, LoadError> {
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let time_index = headers
            .iter()
            .position(|h| *h == input.time_column)
            .ok_or_else(|| LoadError::MissingTimeColumn(input.time_column.clone()))?;

        let mut timestamps = Vec::new();
        let mut columns: FxHashMap<String, Vec<Float>> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != time_index)
            .map(|(_, h)| (h.clone(), Vec::new()))
            .collect();

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let row = row + 1;

            let raw_timestamp = record.get(time_index).unwrap_or("").trim();
            let naive = NaiveDateTime::parse_from_str(raw_timestamp, &input.time_format)
                .map_err(|_| LoadError::Timestamp {
                    value: raw_timestamp.to_string(),
                    row,
                    format: input.time_format.clone(),
                })?;
            let timestamp = Utc.from_utc_datetime(&naive);

            if let Some(previous) = timestamps.last() {
                if timestamp < *previous {
                    return Err(LoadError::Unordered(row));
                }
            }
            timestamps.push(timestamp);

            for (index, header) in headers.iter().enumerate() {
                if index == time_index {
                    continue;
                }

                let raw = record.get(index).unwrap_or("").trim();
                let value = parse_value(raw, &input.missing_value_sentinels).ok_or_else(|| {
                    LoadError::Value {
                        value: raw.to_string(),
                        column: header.clone(),
                        row,
                    }
                })?;

                if let Some(column) = columns.get_mut(header) {
                    column.push(value);
                }
            }
        }

        Ok(ObservationRecord {
            timestamps,
            columns,
        })
    }

    /// Number of rows in the record.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The UTC time index, monotonically non-decreasing.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Values of a named column, or `None` if the table has no
    /// such column.
    pub fn column(&self, name: &str) -> Option<&[Float]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    /// Checks whether a named column exists in the record.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// Parses one cell. Empty cells and configured sentinel codes become
/// NaN, everything else must be a finite-syntax float.
fn parse_value(raw: &str, missing_value_sentinels: &[String]) -> Option<Float> {
    if raw.is_empty() || missing_value_sentinels.iter().any(|m| m == raw) {
        return Some(Float::NAN);
    }

    raw.parse::<Float>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::configuration::Input;
    use std::path::PathBuf;

    fn test_input() -> Input {
        Input {
            path: PathBuf::from("unused.csv"),
            time_column: "TIMESTAMP_START".to_string(),
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            missing_value_sentinels: vec!["-9999".to_string(), "-9999.0".to_string()],
        }
    }

    fn record_from(data: &str) -> Result<ObservationRecord, LoadError> {
        let reader = csv::Reader::from_reader(data.as_bytes());
        ObservationRecord::from_csv_reader(reader, &test_input())
    }

    #[test]
    fn loads_columns_and_utc_index() {
        let record = record_from(
            "TIMESTAMP_START,P,TA\n\
             2014-01-01 00:00:00,0.5,-12.3\n\
             2014-01-01 06:00:00,0.0,-10.1\n",
        )
        .unwrap();

        assert_eq!(record.len(), 2);
        assert_eq!(
            record.timestamps()[0],
            Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(record.column("P").unwrap(), &[0.5, 0.0]);
        assert_eq!(record.column("TA").unwrap(), &[-12.3, -10.1]);
        assert!(!record.has_column("TIMESTAMP_START"));
    }

    #[test]
    fn sentinels_and_empty_cells_become_nan() {
        let record = record_from(
            "TIMESTAMP_START,P\n\
             2014-01-01 00:00:00,-9999\n\
             2014-01-01 06:00:00,-9999.0\n\
             2014-01-01 12:00:00,\n\
             2014-01-01 18:00:00,1.25\n",
        )
        .unwrap();

        let p = record.column("P").unwrap();
        assert!(p[0].is_nan());
        assert!(p[1].is_nan());
        assert!(p[2].is_nan());
        assert_eq!(p[3], 1.25);
    }

    #[test]
    fn fails_on_malformed_timestamp() {
        let result = record_from(
            "TIMESTAMP_START,P\n\
             01/01/2014 00:00,0.5\n",
        );

        assert!(matches!(result, Err(LoadError::Timestamp { row: 1, .. })));
    }

    #[test]
    fn fails_on_missing_time_column() {
        let result = record_from("TIMESTAMP,P\n2014-01-01 00:00:00,0.5\n");

        assert!(matches!(result, Err(LoadError::MissingTimeColumn(_))));
    }

    #[test]
    fn fails_on_unordered_timestamps() {
        let result = record_from(
            "TIMESTAMP_START,P\n\
             2014-01-02 00:00:00,0.5\n\
             2014-01-01 00:00:00,0.5\n",
        );

        assert!(matches!(result, Err(LoadError::Unordered(2))));
    }

    #[test]
    fn fails_on_unparsable_value() {
        let result = record_from(
            "TIMESTAMP_START,P\n\
             2014-01-01 00:00:00,n/a\n",
        );

        assert!(matches!(result, Err(LoadError::Value { .. })));
    }
}

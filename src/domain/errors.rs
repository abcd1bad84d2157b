// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core error definitions for the staged bulk loader.
//!
//! Every operation surfaces its failure to the immediate caller through
//! `LoaderError`. Nothing in the engine retries; the payloads carry enough
//! detail (row counts, drifted columns, captured stderr) to diagnose a run
//! without repeating it.

use crate::domain::entities::SchemaComparisonResult;
use thiserror::Error;

/// Error types encountered while loading, checking, merging or importing.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The input file could not be opened or read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The input file was readable but a record could not be decoded.
    #[error("Read failed for {file}: {reason}")]
    ReadError { file: String, reason: String },

    /// The store rejected a batch append. Earlier batches stay committed.
    #[error("Load into {table} failed at batch {batch}: {reason}")]
    LoadError {
        table: String,
        batch: u64,
        reason: String,
    },

    #[error("Schema drift detected: {}", describe_drift(.0))]
    SchemaDriftError(Vec<SchemaComparisonResult>),

    #[error("Staging table {staging_table} contains {row_count} records, clear table before merging data")]
    DatabaseMergeError {
        staging_table: String,
        row_count: u64,
    },

    /// Nonzero exit from the external import tool; `stderr` is kept verbatim.
    #[error("Import tool exited with code {exit_code}: {stderr}")]
    ImportAdapterError { exit_code: i32, stderr: String },

    #[error("Geometry decode failed at row {row}: {reason}")]
    GeometryError { row: usize, reason: String },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<oracle::Error> for LoaderError {
    fn from(e: oracle::Error) -> Self {
        LoaderError::DatabaseError(e.to_string())
    }
}

impl From<r2d2::Error> for LoaderError {
    fn from(e: r2d2::Error) -> Self {
        LoaderError::DatabaseError(format!("connection pool: {}", e))
    }
}

fn describe_drift(results: &[SchemaComparisonResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "{} (file {}): extra {:?}, missing {:?}",
                r.table_name, r.file, r.extra_columns, r.missing_columns
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A specialized Result type for the staged bulk loader.
pub type Result<T> = std::result::Result<T, LoaderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Verdict;

    #[test]
    fn test_drift_message_lists_every_pair() {
        let err = LoaderError::SchemaDriftError(vec![
            SchemaComparisonResult {
                table_name: "people".into(),
                file: "people.csv".into(),
                file_columns: vec!["A".into(), "B".into(), "D".into()],
                table_columns: vec!["A".into(), "B".into(), "C".into()],
                verdict: Verdict::Drift,
                extra_columns: vec!["D".into()],
                missing_columns: vec!["C".into()],
            },
            SchemaComparisonResult {
                table_name: "places".into(),
                file: "places.csv".into(),
                file_columns: vec!["X".into()],
                table_columns: vec![],
                verdict: Verdict::Drift,
                extra_columns: vec!["X".into()],
                missing_columns: vec![],
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("people (file people.csv): extra [\"D\"], missing [\"C\"]"));
        assert!(msg.contains("places"));
    }

    #[test]
    fn test_merge_error_carries_row_count() {
        let err = LoaderError::DatabaseMergeError {
            staging_table: "z_staging_dynamic".into(),
            row_count: 42,
        };
        assert!(err.to_string().contains("42 records"));
    }
}

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

//! # Domain Entities
//!
//! Entities are the "Nouns" of the loader: the tables we write to, the
//! columns we read from a file, the batches we append, and the reports we
//! hand back to the caller.
//!
//! We use the `serde` crate so that summaries and comparison results can be
//! written out as JSON by the CLI.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a database lives: server, database (service) and default schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseTarget {
    pub server: String,
    pub port: Option<u16>,
    pub database: String,
    pub schema: String,
}

impl DatabaseTarget {
    /// EZConnect string, e.g. `//dbhost:1521/ORCLPDB1`.
    pub fn connect_string(&self) -> String {
        match self.port {
            Some(port) => format!("//{}:{}/{}", self.server, port, self.database),
            None => format!("//{}/{}", self.server, self.database),
        }
    }

    /// Builds a reference to a table living in this target's schema.
    pub fn table(&self, name: &str) -> TableRef {
        TableRef {
            server: self.server.clone(),
            database: self.database.clone(),
            schema: self.schema.clone(),
            table: name.to_string(),
        }
    }
}

/// `TableRef` identifies one persistent relation. It is never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub server: String,
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// The declared type of a column read from a delimited file.
///
/// Everything is `Text` unless the caller asks otherwise, which leaves type
/// coercion to the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    #[default]
    Text,
    Integer,
    Float,
    Timestamp,
}

/// One entry of the schema-on-read model: a column name and its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::Text,
        }
    }
}

/// A single value inside a `RowBatch`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
}

/// A bounded slice of rows that is appended to a table as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    /// Ordered column layout shared by every row.
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RowBatch {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Gives every row the same value in one column. The column at
    /// `existing` is overwritten in place; without one, a column is added.
    pub fn set_constant_column(
        &mut self,
        existing: Option<usize>,
        spec: ColumnSpec,
        value: CellValue,
    ) {
        match existing.filter(|&i| i < self.columns.len()) {
            Some(index) => {
                self.columns[index] = spec;
                for row in &mut self.rows {
                    row[index] = value.clone();
                }
            }
            None => {
                self.columns.push(spec);
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Replaces the column names, keeping types and positions.
    pub fn rename_columns(&mut self, names: &[String]) {
        for (spec, name) in self.columns.iter_mut().zip(names) {
            spec.name = name.clone();
        }
    }
}

/// Result of a row-set query: column names and nullable text values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Progress record for one appended batch. It only lives for the duration
/// of a load call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBatch {
    /// 1-based position of the batch in the file.
    pub ordinal: u64,
    /// Rows in this batch.
    pub rows: u64,
    /// Rows appended so far, this batch included.
    pub cumulative_rows: u64,
    pub capture_timestamp: Option<NaiveDateTime>,
}

/// The "Report Card" for a load call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub table: String,
    pub total_rows: u64,
    pub batches: Vec<LoadBatch>,
    /// The single timestamp stamped on every row, when one was requested.
    pub capture_timestamp: Option<NaiveDateTime>,
}

/// Whether the shared staging table can accept a new merge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StagingState {
    Empty,
    Dirty,
}

impl StagingState {
    pub fn from_row_count(count: u64) -> Self {
        if count > 0 {
            StagingState::Dirty
        } else {
            StagingState::Empty
        }
    }
}

/// Per-pair outcome of a schema comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Match,
    Drift,
}

impl Verdict {
    /// 0 for a match, 1 for drift; summed across pairs to gate a load.
    pub fn score(self) -> u32 {
        match self {
            Verdict::Match => 0,
            Verdict::Drift => 1,
        }
    }
}

/// The outcome of comparing one file's columns with one live table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaComparisonResult {
    pub table_name: String,
    pub file: String,
    /// Sorted file columns, metadata-only columns included.
    pub file_columns: Vec<String>,
    /// Sorted live table columns.
    pub table_columns: Vec<String>,
    pub verdict: Verdict,
    /// In the file but not in the table.
    pub extra_columns: Vec<String>,
    /// In the table but not in the file.
    pub missing_columns: Vec<String>,
}

/// Instructions for one run of the external bulk-import tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCommand {
    pub source: String,
    pub server: String,
    pub database: String,
    pub target: String,
    pub schema: String,
    pub delimiter: char,
    pub truncate: bool,
}

/// What the external process handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ImportResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(port: Option<u16>) -> DatabaseTarget {
        DatabaseTarget {
            server: "dbhost".into(),
            port,
            database: "ORCLPDB1".into(),
            schema: "ETL".into(),
        }
    }

    #[test]
    fn test_connect_string() {
        assert_eq!(target(None).connect_string(), "//dbhost/ORCLPDB1");
        assert_eq!(target(Some(1521)).connect_string(), "//dbhost:1521/ORCLPDB1");
    }

    #[test]
    fn test_table_ref_inherits_target() {
        let t = target(None).table("sales");
        assert_eq!(t.schema, "ETL");
        assert_eq!(t.table, "sales");
        assert_eq!(t.to_string(), "ETL.sales");
    }

    #[test]
    fn test_set_constant_column_appends_when_new() {
        let mut batch = RowBatch::new(vec![ColumnSpec::text("a")]);
        batch.rows.push(vec![CellValue::Text("1".into())]);
        batch.rows.push(vec![CellValue::Null]);
        batch.set_constant_column(None, ColumnSpec::text("src"), CellValue::Text("x".into()));

        assert_eq!(batch.column_names(), vec!["a", "src"]);
        assert!(batch.rows.iter().all(|r| r[1] == CellValue::Text("x".into())));
    }

    #[test]
    fn test_set_constant_column_overwrites_existing() {
        let mut batch = RowBatch::new(vec![ColumnSpec::text("src"), ColumnSpec::text("a")]);
        batch.rows.push(vec![CellValue::Text("old".into()), CellValue::Text("1".into())]);
        batch.set_constant_column(Some(0), ColumnSpec::text("src"), CellValue::Text("x".into()));

        assert_eq!(batch.column_names(), vec!["src", "a"]);
        assert_eq!(
            batch.rows[0],
            vec![CellValue::Text("x".into()), CellValue::Text("1".into())]
        );
    }

    #[test]
    fn test_staging_state_from_count() {
        assert_eq!(StagingState::from_row_count(0), StagingState::Empty);
        assert_eq!(StagingState::from_row_count(3), StagingState::Dirty);
    }
}

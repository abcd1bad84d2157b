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

//! # Chunked Table Loader
//!
//! Streams a delimited file into a table one bounded batch at a time.
//!
//! 1. **Read**: the file is decoded into batches of at most `chunk_size` rows.
//! 2. **Stamp**: when requested, one capture timestamp taken at call start is
//!    added as a column to every batch.
//! 3. **Append**: each batch is appended and committed before the next one is
//!    read. A rejected batch stops the load; batches already committed stay.

use crate::config::{parse_delimiter, LoaderConfig};
use crate::domain::column_naming::format_merge_columns;
use crate::domain::entities::{
    CellValue, ColumnSpec, ColumnType, LoadBatch, LoadSummary, TableRef,
};
use crate::domain::errors::{LoaderError, Result};
use crate::infrastructure::delimited::batch_reader::{open_input, BatchReader};
use crate::ports::metadata_port::MetadataPort;
use crate::ports::sql_port::SqlPort;
use chrono::Local;
use log::{info, warn};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Per-call knobs for a load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub chunk_size: usize,
    pub delimiter: u8,
    pub column_types: HashMap<String, ColumnType>,
    /// Name of the capture-timestamp column, when one should be added.
    pub capture_timestamp: Option<String>,
    /// Rename the header to `COL1..COLn` before appending.
    pub positional_columns: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            delimiter: b',',
            column_types: HashMap::new(),
            capture_timestamp: None,
            positional_columns: false,
        }
    }
}

impl LoadOptions {
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        Ok(Self {
            chunk_size: config.chunk_size,
            delimiter: parse_delimiter(&config.delimiter)?,
            column_types: config.column_types.clone(),
            capture_timestamp: None,
            positional_columns: false,
        })
    }

    pub fn with_capture_timestamp(mut self, column: &str) -> Self {
        self.capture_timestamp = Some(column.to_string());
        self
    }

    pub fn with_positional_columns(mut self, enabled: bool) -> Self {
        self.positional_columns = enabled;
        self
    }
}

pub struct TableLoader {
    sql: Arc<dyn SqlPort>,
    metadata: Arc<dyn MetadataPort>,
}

impl TableLoader {
    pub fn new(sql: Arc<dyn SqlPort>, metadata: Arc<dyn MetadataPort>) -> Self {
        Self { sql, metadata }
    }

    /// Opens `path` (gzip-aware) and loads it into `table`.
    pub fn load_file(
        &self,
        table: &TableRef,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<LoadSummary> {
        let input = open_input(path)?;
        self.load(table, input, &path.display().to_string(), options)
    }

    /// Appends every row of `input` to `table`, batch by batch.
    ///
    /// `source` labels log lines and read errors.
    pub fn load<R: Read>(
        &self,
        table: &TableRef,
        input: R,
        source: &str,
        options: &LoadOptions,
    ) -> Result<LoadSummary> {
        // Taken once so every row of this call carries the same value.
        let capture = options
            .capture_timestamp
            .as_ref()
            .map(|column| (column.clone(), Local::now().naive_local()));

        let reader = BatchReader::new(
            input,
            source,
            options.delimiter,
            options.chunk_size,
            &options.column_types,
        )?;

        let positional = if options.positional_columns {
            let names: Vec<&str> = reader.columns().iter().map(|c| c.name.as_str()).collect();
            Some(format_merge_columns(&names))
        } else {
            None
        };

        info!("Loading {} into {}", source, table);

        let mut summary = LoadSummary {
            table: table.to_string(),
            total_rows: 0,
            batches: Vec::new(),
            capture_timestamp: capture.as_ref().map(|(_, ts)| *ts),
        };

        for (index, batch_result) in reader.enumerate() {
            let mut batch = batch_result?;
            let ordinal = index as u64 + 1;

            if let Some(names) = &positional {
                batch.rename_columns(names);
            }
            if let Some((column, ts)) = &capture {
                // A header that already carries the column gets its values replaced.
                let wanted = self.metadata.normalize_identifier(column);
                let existing = batch
                    .columns
                    .iter()
                    .position(|c| self.metadata.normalize_identifier(&c.name) == wanted);
                batch.set_constant_column(
                    existing,
                    ColumnSpec {
                        name: column.clone(),
                        column_type: ColumnType::Timestamp,
                    },
                    CellValue::Timestamp(*ts),
                );
            }

            let rows = self
                .sql
                .append_batch(table, &batch)
                .map_err(|e| LoaderError::LoadError {
                    table: table.to_string(),
                    batch: ordinal,
                    reason: e.to_string(),
                })?;

            summary.total_rows += rows;
            info!(
                "Table: {} Batch: {} Rows: {} Overall Rows: {}",
                table, ordinal, rows, summary.total_rows
            );
            summary.batches.push(LoadBatch {
                ordinal,
                rows,
                cumulative_rows: summary.total_rows,
                capture_timestamp: summary.capture_timestamp,
            });
        }

        info!(
            "Finished loading {}: {} rows in {} batches",
            table,
            summary.total_rows,
            summary.batches.len()
        );
        Ok(summary)
    }

    /// Deletes every row of `table`. Returns false (and only logs) when the
    /// table does not exist.
    pub fn truncate_table(&self, table: &TableRef) -> Result<bool> {
        if !self.metadata.table_exists(table)? {
            warn!("{} does not exist, skipping truncate", table);
            return Ok(false);
        }
        self.sql.delete_all(table)?;
        info!("Truncated Table {}", table);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{target, RecordingStore};
    use std::io::Write;

    fn rows(n: usize) -> String {
        let mut body = String::from("name,age,city\n");
        for i in 0..n {
            body.push_str(&format!("person{},{},town{}\n", i, 20 + i, i % 3));
        }
        body
    }

    fn loader(store: &Arc<RecordingStore>) -> TableLoader {
        TableLoader::new(store.clone(), store.clone())
    }

    fn options(chunk_size: usize) -> LoadOptions {
        LoadOptions {
            chunk_size,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn test_batch_counts_and_cumulative_progress() {
        for (n, c) in [(0usize, 3usize), (1, 1), (7, 3), (9, 3), (10, 10_000), (25, 4)] {
            let store = Arc::new(RecordingStore::default());
            let summary = loader(&store)
                .load(&target().table("people"), rows(n).as_bytes(), "mem", &options(c))
                .unwrap();

            assert_eq!(summary.total_rows, n as u64);
            assert_eq!(summary.batches.len(), n.div_ceil(c));
            assert_eq!(store.appended().len(), n.div_ceil(c));

            let mut last = 0;
            for (i, batch) in summary.batches.iter().enumerate() {
                assert_eq!(batch.ordinal, i as u64 + 1);
                assert!(batch.rows <= c as u64);
                assert!(batch.cumulative_rows > last);
                last = batch.cumulative_rows;
            }
            assert_eq!(last, n as u64);
        }
    }

    #[test]
    fn test_capture_timestamp_is_shared_by_every_row() {
        let store = Arc::new(RecordingStore::default());
        let opts = options(2).with_capture_timestamp("batch_date");
        let summary = loader(&store)
            .load(&target().table("people"), rows(5).as_bytes(), "mem", &opts)
            .unwrap();

        let stamp = summary.capture_timestamp.expect("timestamp requested");
        let appended = store.appended();
        assert_eq!(appended.len(), 3);
        for (_, batch) in &appended {
            assert_eq!(batch.columns.last().unwrap().name, "batch_date");
            assert_eq!(batch.columns.last().unwrap().column_type, ColumnType::Timestamp);
            for row in &batch.rows {
                assert_eq!(row.last().unwrap(), &CellValue::Timestamp(stamp));
            }
        }
        assert!(summary.batches.iter().all(|b| b.capture_timestamp == Some(stamp)));
    }

    #[test]
    fn test_capture_timestamp_overwrites_column_already_in_file() {
        let store = Arc::new(RecordingStore::default());
        let opts = options(10).with_capture_timestamp("batch_date");
        let body = "name,batch_date\nann,2020-01-01\nbob,\n";
        let summary = loader(&store)
            .load(&target().table("people"), body.as_bytes(), "mem", &opts)
            .unwrap();

        let stamp = summary.capture_timestamp.expect("timestamp requested");
        let (_, batch) = &store.appended()[0];
        assert_eq!(batch.column_names(), vec!["name", "batch_date"]);
        assert_eq!(batch.columns[1].column_type, ColumnType::Timestamp);
        for row in &batch.rows {
            assert_eq!(row.len(), 2);
            assert_eq!(row[1], CellValue::Timestamp(stamp));
        }
    }

    #[test]
    fn test_no_timestamp_column_unless_requested() {
        let store = Arc::new(RecordingStore::default());
        let summary = loader(&store)
            .load(&target().table("people"), rows(2).as_bytes(), "mem", &options(10))
            .unwrap();
        assert!(summary.capture_timestamp.is_none());
        assert_eq!(store.appended()[0].1.column_names(), vec!["name", "age", "city"]);
    }

    #[test]
    fn test_columns_are_text_unless_typed() {
        let store = Arc::new(RecordingStore::default());
        let mut opts = options(10);
        opts.column_types.insert("age".into(), ColumnType::Integer);
        loader(&store)
            .load(&target().table("people"), rows(1).as_bytes(), "mem", &opts)
            .unwrap();

        let (_, batch) = &store.appended()[0];
        assert_eq!(batch.rows[0][0], CellValue::Text("person0".into()));
        assert_eq!(batch.rows[0][1], CellValue::Integer(20));
    }

    #[test]
    fn test_positional_columns_rename_header() {
        let store = Arc::new(RecordingStore::default());
        let opts = options(10).with_positional_columns(true);
        loader(&store)
            .load(&target().table("stage"), rows(3).as_bytes(), "mem", &opts)
            .unwrap();
        assert_eq!(store.appended()[0].1.column_names(), vec!["COL1", "COL2", "COL3"]);
    }

    #[test]
    fn test_rejected_batch_aborts_remaining_batches() {
        let store = Arc::new(RecordingStore {
            fail_on_append: Some(2),
            ..RecordingStore::default()
        });
        let result =
            loader(&store).load(&target().table("people"), rows(10).as_bytes(), "mem", &options(3));

        match result {
            Err(LoaderError::LoadError { table, batch, reason }) => {
                assert_eq!(table, "ETL.people");
                assert_eq!(batch, 2);
                assert!(reason.contains("ORA-00001"));
            }
            other => panic!("expected load error, got {:?}", other),
        }
        // The first batch stays committed; nothing after the failure is sent.
        assert_eq!(store.appended().len(), 1);
        let attempts = store.calls().iter().filter(|c| c.starts_with("append")).count();
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let store = Arc::new(RecordingStore::default());
        let result = loader(&store).load_file(
            &target().table("people"),
            Path::new("/no/such/file.csv"),
            &options(10),
        );
        assert!(matches!(result, Err(LoaderError::IoError(_))));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_load_file_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", rows(4)).unwrap();
        let store = Arc::new(RecordingStore::default());
        let summary = loader(&store)
            .load_file(&target().table("people"), file.path(), &options(3))
            .unwrap();
        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.batches.len(), 2);
    }

    #[test]
    fn test_options_from_config() {
        let config = LoaderConfig {
            chunk_size: 50,
            delimiter: "pipe".into(),
            ..LoaderConfig::default()
        };
        let opts = LoadOptions::from_config(&config).unwrap();
        assert_eq!(opts.chunk_size, 50);
        assert_eq!(opts.delimiter, b'|');
        assert!(opts.capture_timestamp.is_none());
    }

    #[test]
    fn test_truncate_skips_missing_table() {
        let store = Arc::new(RecordingStore::default().with_table("people", &["name"]).with_rows("people", 9));
        let loader = loader(&store);

        assert!(loader.truncate_table(&target().table("people")).unwrap());
        assert_eq!(store.row_counts.lock().unwrap()["people"], 0);

        assert!(!loader.truncate_table(&target().table("ghost")).unwrap());
        assert!(!store.calls().contains(&"delete ghost".to_string()));
    }
}

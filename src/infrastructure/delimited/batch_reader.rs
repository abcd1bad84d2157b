//! Infrastructure adapter for streaming a delimited file as bounded row batches.
//!
//! The reader never holds more than one batch of rows in memory. The header
//! row defines the schema-on-read model: every column is text unless the
//! caller declared a type for it by name.

use crate::domain::entities::{CellValue, ColumnSpec, ColumnType, RowBatch};
use crate::domain::errors::{LoaderError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{Reader, ReaderBuilder, StringRecord};
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Opens a file for reading, decompressing `*.gz` inputs on the fly.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(128 * 1024, file);
    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gzip {
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Iterator over `RowBatch`es of at most `chunk_size` rows, in file order.
pub struct BatchReader<R: Read> {
    reader: Reader<R>,
    source: String,
    columns: Vec<ColumnSpec>,
    chunk_size: usize,
    record: StringRecord,
    finished: bool,
}

impl<R: Read> BatchReader<R> {
    /// Reads the header row and resolves the column layout.
    ///
    /// `source` only labels error messages.
    pub fn new(
        input: R,
        source: &str,
        delimiter: u8,
        chunk_size: usize,
        column_types: &HashMap<String, ColumnType>,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(LoaderError::ConfigError(
                "chunk size must be at least 1".to_string(),
            ));
        }
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(input);

        let columns = reader
            .headers()
            .map_err(|e| map_csv_error(source, e))?
            .iter()
            .map(|name| ColumnSpec {
                name: name.to_string(),
                column_type: column_types.get(name).copied().unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            reader,
            source: source.to_string(),
            columns,
            chunk_size,
            record: StringRecord::new(),
            finished: false,
        })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn next_batch(&mut self) -> Result<Option<RowBatch>> {
        let mut batch = RowBatch::new(self.columns.clone());
        while batch.len() < self.chunk_size {
            let more = self
                .reader
                .read_record(&mut self.record)
                .map_err(|e| map_csv_error(&self.source, e))?;
            if !more {
                self.finished = true;
                break;
            }
            let line = self.record.position().map(|p| p.line()).unwrap_or(0);
            let mut row = Vec::with_capacity(self.columns.len());
            for (spec, raw) in self.columns.iter().zip(self.record.iter()) {
                let value = coerce(raw, spec.column_type).map_err(|reason| {
                    LoaderError::ReadError {
                        file: self.source.clone(),
                        reason: format!("line {}, column {}: {}", line, spec.name, reason),
                    }
                })?;
                row.push(value);
            }
            batch.rows.push(row);
        }
        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}

impl<R: Read> Iterator for BatchReader<R> {
    type Item = Result<RowBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads the header and up to `sample_rows` records, returning the header.
///
/// Reading the sample makes a truncated or undecodable file fail here rather
/// than halfway through a load.
pub fn sample_columns<R: Read>(
    input: R,
    source: &str,
    delimiter: u8,
    sample_rows: usize,
) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| map_csv_error(source, e))?
        .iter()
        .map(str::to_string)
        .collect();
    for record in reader.records().take(sample_rows) {
        record.map_err(|e| map_csv_error(source, e))?;
    }
    Ok(headers)
}

/// Converts a raw field into a value of the declared type. Empty is NULL.
pub fn coerce(raw: &str, column_type: ColumnType) -> std::result::Result<CellValue, String> {
    if raw.is_empty() {
        return Ok(CellValue::Null);
    }
    match column_type {
        ColumnType::Text => Ok(CellValue::Text(raw.to_string())),
        ColumnType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(CellValue::Integer)
            .map_err(|e| format!("'{}' is not an integer ({})", raw, e)),
        ColumnType::Float => raw
            .trim()
            .parse::<f64>()
            .map(CellValue::Float)
            .map_err(|e| format!("'{}' is not a number ({})", raw, e)),
        ColumnType::Timestamp => parse_timestamp(raw.trim())
            .map(CellValue::Timestamp)
            .ok_or_else(|| format!("'{}' is not a timestamp", raw)),
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn map_csv_error(source: &str, e: csv::Error) -> LoaderError {
    let reason = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => LoaderError::IoError(io),
        _ => LoaderError::ReadError {
            file: source.to_string(),
            reason,
        },
    }
}

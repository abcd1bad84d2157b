//! # Schema Drift Detector
//!
//! A pre-load gate: for each (table, file) pair, the file's header is
//! compared with the live table's columns, ignoring order. Any difference in
//! any pair fails the whole check.

use crate::config::{parse_delimiter, SchemaCheckConfig};
use crate::domain::entities::{DatabaseTarget, SchemaComparisonResult, Verdict};
use crate::domain::errors::{LoaderError, Result};
use crate::infrastructure::delimited::batch_reader::{open_input, sample_columns};
use crate::ports::metadata_port::MetadataPort;
use log::{info, warn};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct SchemaDriftDetector {
    metadata: Arc<dyn MetadataPort>,
    target: DatabaseTarget,
    delimiter: u8,
    sample_rows: usize,
}

impl SchemaDriftDetector {
    pub fn new(
        metadata: Arc<dyn MetadataPort>,
        target: DatabaseTarget,
        config: &SchemaCheckConfig,
    ) -> Result<Self> {
        Ok(Self {
            metadata,
            target,
            delimiter: parse_delimiter(&config.delimiter)?,
            sample_rows: config.sample_rows.max(1),
        })
    }

    /// Checks every pair and fails with `SchemaDriftError` listing each
    /// drifted pair when any of them drifts.
    ///
    /// `metadata_columns` are columns the loader adds later (a capture
    /// timestamp, for instance); they count as present in every file.
    pub fn check_schemas(
        &self,
        pairs: &[(String, PathBuf)],
        metadata_columns: &[String],
    ) -> Result<Vec<SchemaComparisonResult>> {
        info!("checking schema changes");
        let mut results = Vec::with_capacity(pairs.len());
        for (table, file) in pairs {
            results.push(self.compare_file(table, file, metadata_columns)?);
        }

        let score: u32 = results.iter().map(|r| r.verdict.score()).sum();
        if score > 0 {
            let drifted = results
                .into_iter()
                .filter(|r| r.verdict == Verdict::Drift)
                .collect();
            return Err(LoaderError::SchemaDriftError(drifted));
        }
        Ok(results)
    }

    pub fn compare_file(
        &self,
        table: &str,
        file: &Path,
        metadata_columns: &[String],
    ) -> Result<SchemaComparisonResult> {
        let input = open_input(file)?;
        self.compare(table, input, &file.display().to_string(), metadata_columns)
    }

    /// Compares one file (already opened) with one table.
    pub fn compare<R: Read>(
        &self,
        table: &str,
        input: R,
        source: &str,
        metadata_columns: &[String],
    ) -> Result<SchemaComparisonResult> {
        let mut file_columns = sample_columns(input, source, self.delimiter, self.sample_rows)?;
        file_columns.extend(metadata_columns.iter().cloned());

        let table_ref = self.target.table(table);
        let table_columns = self.metadata.get_columns(&table_ref)?;

        let file_set: BTreeSet<String> = file_columns
            .iter()
            .map(|c| self.metadata.normalize_identifier(c))
            .collect();
        let table_set: BTreeSet<String> = table_columns
            .iter()
            .map(|c| self.metadata.normalize_identifier(c))
            .collect();

        let extra_columns: Vec<String> = file_set.difference(&table_set).cloned().collect();
        let missing_columns: Vec<String> = table_set.difference(&file_set).cloned().collect();
        let verdict = if extra_columns.is_empty() && missing_columns.is_empty() {
            info!("{}: no changes", source);
            Verdict::Match
        } else {
            warn!(
                "{} drifted from {}: new columns {:?}, missing columns {:?}",
                source, table_ref, extra_columns, missing_columns
            );
            Verdict::Drift
        };

        Ok(SchemaComparisonResult {
            table_name: table.to_string(),
            file: source.to_string(),
            file_columns: file_set.into_iter().collect(),
            table_columns: table_set.into_iter().collect(),
            verdict,
            extra_columns,
            missing_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{target, RecordingStore};
    use std::io::Write;

    fn detector(store: RecordingStore) -> SchemaDriftDetector {
        let config = SchemaCheckConfig {
            sample_rows: 2,
            delimiter: "|".into(),
        };
        SchemaDriftDetector::new(Arc::new(store), target(), &config).unwrap()
    }

    fn temp_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    #[test]
    fn test_same_columns_in_any_order_match() {
        let d = detector(RecordingStore::default().with_table("people", &["A", "B", "C"]));
        let result = d.compare("people", "C|A|B\n1|2|3\n".as_bytes(), "people.csv", &[]).unwrap();
        assert_eq!(result.verdict, Verdict::Match);
        assert!(result.extra_columns.is_empty());
        assert!(result.missing_columns.is_empty());
    }

    #[test]
    fn test_drift_reports_extra_and_missing() {
        let d = detector(RecordingStore::default().with_table("people", &["A", "B", "C"]));
        let result = d.compare("people", "A|B|D\n1|2|3\n".as_bytes(), "people.csv", &[]).unwrap();
        assert_eq!(result.verdict, Verdict::Drift);
        assert_eq!(result.extra_columns, vec!["D"]);
        assert_eq!(result.missing_columns, vec!["C"]);
    }

    #[test]
    fn test_metadata_columns_are_not_drift() {
        let d = detector(
            RecordingStore::default().with_table("people", &["A", "B", "batch_date"]),
        );
        let result = d
            .compare("people", "A|B\n1|2\n".as_bytes(), "people.csv", &["batch_date".into()])
            .unwrap();
        assert_eq!(result.verdict, Verdict::Match);
    }

    #[test]
    fn test_missing_table_is_drift() {
        let d = detector(RecordingStore::default());
        let result = d.compare("ghost", "A\n1\n".as_bytes(), "ghost.csv", &[]).unwrap();
        assert_eq!(result.verdict, Verdict::Drift);
        assert_eq!(result.extra_columns, vec!["A"]);
    }

    #[test]
    fn test_check_fails_when_any_pair_drifts() {
        let d = detector(
            RecordingStore::default()
                .with_table("people", &["A", "B", "C"])
                .with_table("places", &["X", "Y"]),
        );
        let good = temp_file("A|B|C\n1|2|3\n");
        let bad = temp_file("X|Z\n1|2\n");
        let pairs = vec![
            ("people".to_string(), good.path().to_path_buf()),
            ("places".to_string(), bad.path().to_path_buf()),
        ];

        match d.check_schemas(&pairs, &[]) {
            Err(LoaderError::SchemaDriftError(drifted)) => {
                assert_eq!(drifted.len(), 1);
                assert_eq!(drifted[0].table_name, "places");
                assert_eq!(drifted[0].extra_columns, vec!["Z"]);
                assert_eq!(drifted[0].missing_columns, vec!["Y"]);
            }
            other => panic!("expected drift, got {:?}", other),
        }
    }

    #[test]
    fn test_check_passes_when_all_pairs_match() {
        let d = detector(RecordingStore::default().with_table("people", &["A", "B"]));
        let file = temp_file("B|A\n1|2\n");
        let results = d
            .check_schemas(&[("people".to_string(), file.path().to_path_buf())], &[])
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].verdict, Verdict::Match);
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        let d = detector(RecordingStore::default().with_table("people", &["A"]));
        let result = d.check_schemas(&[("people".to_string(), PathBuf::from("/no/such.csv"))], &[]);
        assert!(matches!(result, Err(LoaderError::IoError(_))));
    }
}

//! In-memory fakes for the ports, shared by the application tests.

use crate::domain::entities::{DatabaseTarget, ImportResult, RowBatch, RowSet, TableRef};
use crate::domain::errors::{LoaderError, Result};
use crate::ports::command_port::CommandPort;
use crate::ports::metadata_port::MetadataPort;
use crate::ports::sql_port::SqlPort;
use std::collections::HashMap;
use std::sync::Mutex;

pub fn target() -> DatabaseTarget {
    DatabaseTarget {
        server: "dbhost".into(),
        port: None,
        database: "ORCLPDB1".into(),
        schema: "ETL".into(),
    }
}

/// Records every call in order and keeps per-table row counts.
#[derive(Default)]
pub struct RecordingStore {
    pub columns: Mutex<HashMap<String, Vec<String>>>,
    pub row_counts: Mutex<HashMap<String, u64>>,
    pub appended: Mutex<Vec<(String, RowBatch)>>,
    pub procedures: Mutex<Vec<(String, String, String)>>,
    pub calls: Mutex<Vec<String>>,
    /// 1-based append call that the fake rejects.
    pub fail_on_append: Option<usize>,
    pub fail_procedure: bool,
    pub query_result: RowSet,
}

impl RecordingStore {
    pub fn with_table(self, table: &str, columns: &[&str]) -> Self {
        self.columns.lock().unwrap().insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self.row_counts.lock().unwrap().insert(table.to_string(), 0);
        self
    }

    pub fn with_rows(self, table: &str, count: u64) -> Self {
        self.row_counts.lock().unwrap().insert(table.to_string(), count);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn appended(&self) -> Vec<(String, RowBatch)> {
        self.appended.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MetadataPort for RecordingStore {
    fn table_exists(&self, table: &TableRef) -> Result<bool> {
        self.record(format!("exists {}", table.table));
        Ok(self.columns.lock().unwrap().contains_key(&table.table))
    }

    fn get_columns(&self, table: &TableRef) -> Result<Vec<String>> {
        self.record(format!("columns {}", table.table));
        Ok(self
            .columns
            .lock()
            .unwrap()
            .get(&table.table)
            .cloned()
            .unwrap_or_default())
    }

    fn count_rows(&self, table: &TableRef) -> Result<u64> {
        self.record(format!("count {}", table.table));
        Ok(*self.row_counts.lock().unwrap().get(&table.table).unwrap_or(&0))
    }
}

impl SqlPort for RecordingStore {
    fn append_batch(&self, table: &TableRef, batch: &RowBatch) -> Result<u64> {
        self.record(format!("append {}", table.table));
        let attempt = self.calls().iter().filter(|c| c.starts_with("append")).count();
        if self.fail_on_append == Some(attempt) {
            return Err(LoaderError::DatabaseError(
                "ORA-00001: unique constraint violated".to_string(),
            ));
        }
        self.appended
            .lock()
            .unwrap()
            .push((table.table.clone(), batch.clone()));
        *self
            .row_counts
            .lock()
            .unwrap()
            .entry(table.table.clone())
            .or_insert(0) += batch.len() as u64;
        Ok(batch.len() as u64)
    }

    fn delete_all(&self, table: &TableRef) -> Result<()> {
        self.record(format!("delete {}", table.table));
        self.row_counts.lock().unwrap().insert(table.table.clone(), 0);
        Ok(())
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.record(format!("execute {}", sql));
        Ok(())
    }

    fn call_procedure(&self, schema: &str, procedure: &str, argument: &str) -> Result<()> {
        self.record(format!("call {}", procedure));
        if self.fail_procedure {
            return Err(LoaderError::DatabaseError(
                "ORA-20001: merge metadata missing".to_string(),
            ));
        }
        self.procedures.lock().unwrap().push((
            schema.to_string(),
            procedure.to_string(),
            argument.to_string(),
        ));
        Ok(())
    }

    fn query(&self, sql: &str) -> Result<RowSet> {
        self.record(format!("query {}", sql));
        Ok(self.query_result.clone())
    }
}

/// Returns a canned process result and remembers what it was asked to run.
pub struct ScriptedRunner {
    pub result: ImportResult,
    pub invocations: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn exiting(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            result: ImportResult {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
            invocations: Mutex::new(Vec::new()),
        }
    }
}

impl CommandPort for ScriptedRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ImportResult> {
        self.invocations
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(self.result.clone())
    }
}

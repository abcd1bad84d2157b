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

//! Infrastructure adapter implementing both database ports against Oracle.
//!
//! Every call borrows one pooled connection from the `ConnectionProvider`
//! and returns it when the call ends.

use crate::domain::entities::{CellValue, ColumnType, RowBatch, RowSet, TableRef};
use crate::domain::errors::Result;
use crate::infrastructure::oracle::connection_provider::ConnectionProvider;
use crate::infrastructure::oracle::sql_utils::{
    build_count_sql, build_delete_sql, build_insert_sql, build_procedure_call, normalize_identifier,
};
use crate::ports::metadata_port::MetadataPort;
use crate::ports::sql_port::SqlPort;
use chrono::NaiveDateTime;
use log::debug;
use oracle::sql_type::{OracleType, ToSql};
use std::sync::Arc;

const SQL_TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM all_tables WHERE owner = :1 AND table_name = :2";
const SQL_GET_COLUMNS: &str = "
    SELECT column_name
    FROM all_tab_columns
    WHERE owner = :1
      AND table_name = :2
    ORDER BY column_id
";

/// Widest VARCHAR2 bind; longer text values fail the batch.
const TEXT_BIND_BYTES: u32 = 4000;

static NULL_TEXT: Option<String> = None;
static NULL_INTEGER: Option<i64> = None;
static NULL_FLOAT: Option<f64> = None;
static NULL_TIMESTAMP: Option<NaiveDateTime> = None;

pub struct OracleAdapter {
    provider: Arc<ConnectionProvider>,
}

impl OracleAdapter {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }
}

impl MetadataPort for OracleAdapter {
    fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let conn = self.provider.get_conn()?;
        let owner = normalize_identifier(&table.schema);
        let name = normalize_identifier(&table.table);
        let row = conn.query_row(SQL_TABLE_EXISTS, &[&owner, &name])?;
        let count: u64 = row.get(0)?;
        Ok(count > 0)
    }

    fn get_columns(&self, table: &TableRef) -> Result<Vec<String>> {
        let conn = self.provider.get_conn()?;
        let owner = normalize_identifier(&table.schema);
        let name = normalize_identifier(&table.table);
        let rows = conn.query(SQL_GET_COLUMNS, &[&owner, &name])?;
        let mut columns = Vec::new();
        for row_result in rows {
            let row = row_result?;
            let column: String = row.get(0)?;
            columns.push(column);
        }
        Ok(columns)
    }

    fn count_rows(&self, table: &TableRef) -> Result<u64> {
        let conn = self.provider.get_conn()?;
        let row = conn.query_row(&build_count_sql(table), &[])?;
        let count: u64 = row.get(0)?;
        Ok(count)
    }

    fn normalize_identifier(&self, name: &str) -> String {
        normalize_identifier(name)
    }
}

impl SqlPort for OracleAdapter {
    fn append_batch(&self, table: &TableRef, batch: &RowBatch) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let conn = self.provider.get_conn()?;
        let sql = build_insert_sql(table, &batch.column_names());
        debug!("{}", sql);

        let mut stmt = conn.batch(&sql, batch.len()).build()?;
        for (i, spec) in batch.columns.iter().enumerate() {
            stmt.set_type(i + 1, &bind_type(spec.column_type))?;
        }
        for row in &batch.rows {
            let binds: Vec<&dyn ToSql> = row
                .iter()
                .zip(&batch.columns)
                .map(|(value, spec)| bind_value(value, spec.column_type))
                .collect();
            stmt.append_row(&binds)?;
        }
        stmt.execute()?;
        conn.commit()?;
        Ok(batch.len() as u64)
    }

    fn delete_all(&self, table: &TableRef) -> Result<()> {
        self.execute(&build_delete_sql(table))
    }

    fn execute(&self, sql: &str) -> Result<()> {
        let conn = self.provider.get_conn()?;
        debug!("{}", sql);
        conn.execute(sql, &[])?;
        conn.commit()?;
        Ok(())
    }

    fn call_procedure(&self, schema: &str, procedure: &str, argument: &str) -> Result<()> {
        let conn = self.provider.get_conn()?;
        let sql = build_procedure_call(schema, procedure);
        debug!("{} [{}]", sql, argument);
        let argument = argument.to_string();
        conn.execute(&sql, &[&argument])?;
        conn.commit()?;
        Ok(())
    }

    fn query(&self, sql: &str) -> Result<RowSet> {
        let conn = self.provider.get_conn()?;
        debug!("{}", sql);
        let rows = conn.query(sql, &[])?;
        let columns: Vec<String> = rows
            .column_info()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut result = RowSet {
            columns,
            rows: Vec::new(),
        };
        for row_result in rows {
            let row = row_result?;
            let mut values = Vec::with_capacity(result.columns.len());
            for i in 0..result.columns.len() {
                let value: Option<String> = row.get(i)?;
                values.push(value);
            }
            result.rows.push(values);
        }
        Ok(result)
    }
}

fn bind_type(column_type: ColumnType) -> OracleType {
    match column_type {
        ColumnType::Text => OracleType::Varchar2(TEXT_BIND_BYTES),
        ColumnType::Integer => OracleType::Int64,
        ColumnType::Float => OracleType::BinaryDouble,
        ColumnType::Timestamp => OracleType::Timestamp(6),
    }
}

/// NULLs are bound with the column's own type so every row of a batch
/// agrees on the bind type.
fn bind_value(value: &CellValue, column_type: ColumnType) -> &dyn ToSql {
    match value {
        CellValue::Text(s) => s,
        CellValue::Integer(i) => i,
        CellValue::Float(f) => f,
        CellValue::Timestamp(ts) => ts,
        CellValue::Null => match column_type {
            ColumnType::Text => &NULL_TEXT,
            ColumnType::Integer => &NULL_INTEGER,
            ColumnType::Float => &NULL_FLOAT,
            ColumnType::Timestamp => &NULL_TIMESTAMP,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_types_follow_declared_columns() {
        assert_eq!(bind_type(ColumnType::Text), OracleType::Varchar2(4000));
        assert_eq!(bind_type(ColumnType::Integer), OracleType::Int64);
        assert_eq!(bind_type(ColumnType::Timestamp), OracleType::Timestamp(6));
    }
}

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

//! # SQL Port
//!
//! This Port defines the "Data Mover" side of the store: appending row
//! batches, running statements and procedures, and fetching row sets.

use crate::domain::entities::{RowBatch, RowSet, TableRef};
use crate::domain::errors::Result;

/// `SqlPort` is the SQL-execution capability the engine borrows per call.
pub trait SqlPort: Send + Sync {
    /// Appends every row of `batch` to `table` and commits. Either the whole
    /// batch lands or the call fails; existing rows are never replaced.
    ///
    /// Returns the number of rows appended.
    fn append_batch(&self, table: &TableRef, batch: &RowBatch) -> Result<u64>;

    /// Deletes every row of `table` and commits.
    fn delete_all(&self, table: &TableRef) -> Result<()>;

    /// Executes a parameterless statement and commits.
    fn execute(&self, sql: &str) -> Result<()>;

    /// Calls a stored procedure in `schema` with a single text argument.
    fn call_procedure(&self, schema: &str, procedure: &str, argument: &str) -> Result<()>;

    /// Runs a query and returns every value as optional text.
    fn query(&self, sql: &str) -> Result<RowSet>;
}

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

//! # Metadata Port
//!
//! In Hexagonal Architecture, a **Port** is like a "Slot" or a "Contract".
//!
//! This Port defines what it means to "look up table metadata". The drift
//! detector and the merge coordinator only ever talk to this trait, so they
//! can run against Oracle or against an in-memory fake in tests.

use crate::domain::entities::TableRef;
use crate::domain::errors::Result;

/// `MetadataPort` answers questions about live tables.
///
/// `Send + Sync` lets one adapter be shared behind an `Arc`.
pub trait MetadataPort: Send + Sync {
    /// True when the table exists in the referenced schema.
    fn table_exists(&self, table: &TableRef) -> Result<bool>;

    /// Column names of the table in declaration order. Empty when the table
    /// does not exist.
    fn get_columns(&self, table: &TableRef) -> Result<Vec<String>>;

    /// Current number of rows in the table.
    fn count_rows(&self, table: &TableRef) -> Result<u64>;

    /// How the store spells a column name it was given, so file headers and
    /// dictionary names can be compared. Identity unless the store folds case.
    fn normalize_identifier(&self, name: &str) -> String {
        name.to_string()
    }
}

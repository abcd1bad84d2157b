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

//! # Staged Merge Coordinator
//!
//! Moves a file into a target table in two phases so a failed load never
//! leaves the target half-written:
//!
//! `Idle -> Checking -> Staging -> Merging -> Done`
//!
//! * **Checking** counts the rows of the shared staging table. Any rows left
//!   over from an earlier cycle stop the merge with `DatabaseMergeError`; the
//!   caller clears staging out-of-band before retrying.
//! * **Staging** loads the file into the staging table with the chunked
//!   loader, without a capture timestamp.
//! * **Merging** calls the server-side merge procedure with the target table
//!   name as its only argument.
//!
//! The staging check is a check, not a lock. At most one coordinator may run
//! against a given staging table at a time; two callers that check and stage
//! concurrently can interleave rows.

use crate::application::table_loader::{LoadOptions, TableLoader};
use crate::config::MergeConfig;
use crate::domain::entities::{DatabaseTarget, LoadSummary, StagingState, TableRef};
use crate::domain::errors::{LoaderError, Result};
use crate::ports::metadata_port::MetadataPort;
use crate::ports::sql_port::SqlPort;
use log::{error, info};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeState {
    Idle,
    Checking,
    Staging,
    Merging,
    Done,
    Failed,
}

/// What a finished merge cycle reports back.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub target_table: String,
    pub staged: LoadSummary,
}

pub struct StagedMergeCoordinator {
    loader: Arc<TableLoader>,
    sql: Arc<dyn SqlPort>,
    metadata: Arc<dyn MetadataPort>,
    target: DatabaseTarget,
    config: MergeConfig,
    state: MergeState,
    last_staging_state: Option<StagingState>,
}

impl StagedMergeCoordinator {
    pub fn new(
        loader: Arc<TableLoader>,
        sql: Arc<dyn SqlPort>,
        metadata: Arc<dyn MetadataPort>,
        target: DatabaseTarget,
        config: MergeConfig,
    ) -> Self {
        Self {
            loader,
            sql,
            metadata,
            target,
            config,
            state: MergeState::Idle,
            last_staging_state: None,
        }
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Staging state seen by the most recent check; never reused for a
    /// later merge.
    pub fn last_staging_state(&self) -> Option<StagingState> {
        self.last_staging_state
    }

    /// Runs one full cycle for the file at `path`.
    pub fn merge_file(
        &mut self,
        target_table: &str,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<MergeOutcome> {
        self.run(target_table, options, |loader, staging, opts| {
            loader.load_file(staging, path, opts)
        })
    }

    /// Runs one full cycle for an already opened input.
    pub fn merge<R: std::io::Read>(
        &mut self,
        target_table: &str,
        input: R,
        source: &str,
        options: &LoadOptions,
    ) -> Result<MergeOutcome> {
        self.run(target_table, options, |loader, staging, opts| {
            loader.load(staging, input, source, opts)
        })
    }

    fn run<F>(&mut self, target_table: &str, options: &LoadOptions, stage: F) -> Result<MergeOutcome>
    where
        F: FnOnce(&TableLoader, &TableRef, &LoadOptions) -> Result<LoadSummary>,
    {
        let staging = self.target.table(&self.config.staging_table);
        info!("Starting merge of {} via {}", target_table, staging);

        // Checking
        self.state = MergeState::Checking;
        let row_count = self.fail_on_err(self.metadata.count_rows(&staging))?;
        let staging_state = StagingState::from_row_count(row_count);
        self.last_staging_state = Some(staging_state);
        if staging_state == StagingState::Dirty {
            self.state = MergeState::Failed;
            error!("{} holds {} rows; merge of {} refused", staging, row_count, target_table);
            return Err(LoaderError::DatabaseMergeError {
                staging_table: staging.to_string(),
                row_count,
            });
        }

        // Staging
        self.state = MergeState::Staging;
        let stage_options = LoadOptions {
            capture_timestamp: None,
            positional_columns: self.config.positional_columns,
            ..options.clone()
        };
        let staged = self.fail_on_err(stage(self.loader.as_ref(), &staging, &stage_options))?;
        info!("Staged {} rows for {}", staged.total_rows, target_table);

        // Merging
        self.state = MergeState::Merging;
        info!("merging data to {}", target_table);
        let call = self
            .sql
            .call_procedure(&self.target.schema, &self.config.procedure, target_table);
        self.fail_on_err(call)?;

        self.state = MergeState::Done;
        info!("Merge of {} complete", target_table);
        Ok(MergeOutcome {
            target_table: target_table.to_string(),
            staged,
        })
    }

    /// Marks the cycle failed and hands the error back unchanged.
    fn fail_on_err<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = MergeState::Failed;
        }
        result
    }
}

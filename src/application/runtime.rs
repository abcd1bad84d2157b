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

//! # Runtime Context
//!
//! Wires the adapters to the application services once per process. Every
//! service receives its collaborators through its constructor; nothing here
//! is global.

use crate::application::bulk_import::BulkImportAdapter;
use crate::application::schema_check::SchemaDriftDetector;
use crate::application::spatial_query::QueryService;
use crate::application::staged_merge::StagedMergeCoordinator;
use crate::application::table_loader::{LoadOptions, TableLoader};
use crate::config::AppConfig;
use crate::domain::entities::DatabaseTarget;
use crate::domain::errors::Result;
use crate::infrastructure::oracle::connection_provider::ConnectionProvider;
use crate::infrastructure::oracle::oracle_adapter::OracleAdapter;
use crate::infrastructure::process::process_runner::ProcessRunner;
use crate::ports::command_port::CommandPort;
use crate::ports::metadata_port::MetadataPort;
use crate::ports::sql_port::SqlPort;
use std::sync::Arc;

pub struct RuntimeContext {
    pub config: AppConfig,
    pub target: DatabaseTarget,
    pub sql: Arc<dyn SqlPort>,
    pub metadata: Arc<dyn MetadataPort>,
    pub runner: Arc<dyn CommandPort>,
    pub loader: Arc<TableLoader>,
}

impl RuntimeContext {
    /// Opens the connection pool and builds the shared services.
    pub fn init(config: &AppConfig) -> Result<Self> {
        let provider = Arc::new(ConnectionProvider::connect(&config.database, &config.target())?);
        let adapter = Arc::new(OracleAdapter::new(provider));
        Ok(Self::with_ports(
            config,
            adapter.clone(),
            adapter,
            Arc::new(ProcessRunner::new()),
        ))
    }

    /// Builds the services over arbitrary port implementations.
    pub fn with_ports(
        config: &AppConfig,
        sql: Arc<dyn SqlPort>,
        metadata: Arc<dyn MetadataPort>,
        runner: Arc<dyn CommandPort>,
    ) -> Self {
        let loader = Arc::new(TableLoader::new(sql.clone(), metadata.clone()));
        Self {
            config: config.clone(),
            target: config.target(),
            sql,
            metadata,
            runner,
            loader,
        }
    }

    pub fn load_options(&self) -> Result<LoadOptions> {
        LoadOptions::from_config(&self.config.loader)
    }

    pub fn merge_coordinator(&self) -> StagedMergeCoordinator {
        StagedMergeCoordinator::new(
            self.loader.clone(),
            self.sql.clone(),
            self.metadata.clone(),
            self.target.clone(),
            self.config.merge.clone(),
        )
    }

    pub fn drift_detector(&self) -> Result<SchemaDriftDetector> {
        SchemaDriftDetector::new(
            self.metadata.clone(),
            self.target.clone(),
            &self.config.schema_check,
        )
    }

    pub fn bulk_import(&self) -> BulkImportAdapter {
        BulkImportAdapter::new(
            self.runner.clone(),
            self.target.clone(),
            self.config.import.clone(),
        )
    }

    pub fn query_service(&self) -> QueryService {
        QueryService::from_config(self.sql.clone(), self.config.geometry.as_ref())
    }
}

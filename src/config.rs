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

//! Configuration for the loader.
//!
//! `AppConfig` is built once by the caller (from a YAML/JSON file, CLI flags,
//! or both) and handed to each component's constructor. Nothing reads
//! configuration from process-wide state.

use crate::domain::entities::{ColumnType, DatabaseTarget};
use crate::domain::errors::{LoaderError, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// Environment variable consulted when no password is configured.
pub const PASSWORD_ENV: &str = "LOADER_DB_PASSWORD";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub schema_check: SchemaCheckConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub import: ImportConfig,
    pub geometry: Option<GeometryConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub server: String,
    pub port: Option<u16>,
    /// Service name of the database.
    pub database: String,
    pub schema: String,
    /// Without a username the connection uses external (OS) authentication.
    pub username: Option<String>,
    pub password: Option<String>,
    pub pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoaderConfig {
    pub chunk_size: usize,
    pub delimiter: String,
    /// Column name used when a capture timestamp is requested without one.
    pub capture_timestamp_column: String,
    /// Explicit types by column name; unnamed columns are read as text.
    pub column_types: HashMap<String, ColumnType>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            delimiter: ",".to_string(),
            capture_timestamp_column: "batch_date".to_string(),
            column_types: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchemaCheckConfig {
    pub sample_rows: usize,
    pub delimiter: String,
}

impl Default for SchemaCheckConfig {
    fn default() -> Self {
        Self {
            sample_rows: 2,
            delimiter: "|".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MergeConfig {
    pub staging_table: String,
    pub procedure: String,
    /// Rename staged columns to `COL1..COLn` before loading them.
    pub positional_columns: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            staging_table: "z_staging_dynamic".to_string(),
            procedure: "usp_dynamic_merge".to_string(),
            positional_columns: true,
        }
    }
}

/// External import tool settings.
///
/// `Import-DbaCsv` speaks to SQL Server, not Oracle. `sql_instance` and
/// `database` name the instance the tool loads into; when unset, the
/// database server and service name are passed through, which only works
/// when `tool` is an importer that accepts them.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImportConfig {
    pub shell: String,
    pub tool: String,
    /// Value for `-SqlInstance`.
    pub sql_instance: Option<String>,
    /// Value for `-Database`.
    pub database: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            shell: "powershell.exe".to_string(),
            tool: "Import-DbaCsv".to_string(),
            sql_instance: None,
            database: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeometryConfig {
    /// Column holding well-known text.
    pub column: String,
    #[serde(default = "default_geometry_field")]
    pub field: String,
    #[serde(default = "default_crs")]
    pub crs: String,
}

fn default_geometry_field() -> String {
    "geometry".to_string()
}

fn default_crs() -> String {
    "EPSG:4326".to_string()
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    // Overrides for ad-hoc runs
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub database: Option<String>,
    #[arg(long)]
    pub schema: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Delimiter character, or one of: comma, pipe, tab, semicolon, space
    #[arg(long)]
    pub delimiter: Option<String>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Action {
    /// Append a delimited file to a table in chunks
    Load {
        #[arg(long)]
        table: String,
        #[arg(long)]
        file: PathBuf,
        /// Stamp every row with one capture timestamp
        #[arg(long)]
        capture_time: bool,
        #[arg(long)]
        capture_column: Option<String>,
    },
    /// Load a file into the staging table and merge it into a target
    Merge {
        #[arg(long)]
        table: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Compare file headers with live tables before loading
    Check {
        /// TABLE=FILE pair, repeatable
        #[arg(long = "source", value_parser = parse_source, required = true)]
        sources: Vec<(String, PathBuf)>,
        /// Column added later by the loader (e.g. batch_date), repeatable
        #[arg(long = "metadata-column")]
        metadata_columns: Vec<String>,
    },
    /// Hand a file to the external bulk-import tool
    Import {
        #[arg(long)]
        table: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        truncate: bool,
    },
    /// Delete every row of a table
    Truncate {
        #[arg(long)]
        table: String,
    },
    /// Run a query, decoding a WKT column when one is configured or given
    Query {
        #[arg(long)]
        sql: String,
        #[arg(long)]
        geometry_column: Option<String>,
    },
}

fn parse_source(raw: &str) -> std::result::Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((table, file)) if !table.is_empty() && !file.is_empty() => {
            Ok((table.to_string(), PathBuf::from(file)))
        }
        _ => Err(format!("expected TABLE=FILE, got '{}'", raw)),
    }
}

/// Turns a delimiter setting into the single byte the CSV reader needs.
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    let resolved = match raw.to_lowercase().as_str() {
        "comma" => ",".to_string(),
        "pipe" => "|".to_string(),
        "tab" | "\\t" => "\t".to_string(),
        "semicolon" => ";".to_string(),
        "space" => " ".to_string(),
        _ => raw.to_string(),
    };
    let bytes = resolved.as_bytes();
    if bytes.len() != 1 || !bytes[0].is_ascii() {
        return Err(LoaderError::ConfigError(format!(
            "Delimiter must be a single ASCII character, got '{}'",
            raw
        )));
    }
    Ok(bytes[0])
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)
                .map_err(|e| LoaderError::ConfigError(e.to_string()))?
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| LoaderError::ConfigError(e.to_string()))?
        };

        Ok(config)
    }

    /// Builds a configuration purely from command-line flags.
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            database: DatabaseConfig {
                server: args.server.clone().unwrap_or_default(),
                port: args.port,
                database: args.database.clone().unwrap_or_default(),
                schema: args.schema.clone().unwrap_or_default(),
                username: args.username.clone(),
                password: None,
                pool_size: None,
            },
            loader: LoaderConfig::default(),
            schema_check: SchemaCheckConfig::default(),
            merge: MergeConfig::default(),
            import: ImportConfig::default(),
            geometry: None,
        }
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(s) = &args.server { self.database.server = s.clone(); }
        if let Some(p) = args.port { self.database.port = Some(p); }
        if let Some(d) = &args.database { self.database.database = d.clone(); }
        if let Some(s) = &args.schema { self.database.schema = s.clone(); }
        if let Some(u) = &args.username { self.database.username = Some(u.clone()); }
        if let Some(c) = args.chunk_size { self.loader.chunk_size = c; }
        if let Some(d) = &args.delimiter {
            self.loader.delimiter = d.clone();
            self.schema_check.delimiter = d.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.server.is_empty() {
            return Err(LoaderError::ConfigError("database.server is required".into()));
        }
        if self.database.database.is_empty() {
            return Err(LoaderError::ConfigError("database.database is required".into()));
        }
        if self.database.schema.is_empty() {
            return Err(LoaderError::ConfigError("database.schema is required".into()));
        }
        if self.loader.chunk_size == 0 {
            return Err(LoaderError::ConfigError("loader.chunk_size must be at least 1".into()));
        }
        if self.schema_check.sample_rows == 0 {
            return Err(LoaderError::ConfigError(
                "schema_check.sample_rows must be at least 1".into(),
            ));
        }
        parse_delimiter(&self.loader.delimiter)?;
        parse_delimiter(&self.schema_check.delimiter)?;
        Ok(())
    }

    pub fn target(&self) -> DatabaseTarget {
        DatabaseTarget {
            server: self.database.server.clone(),
            port: self.database.port,
            database: self.database.database.clone(),
            schema: self.database.schema.clone(),
        }
    }
}

impl DatabaseConfig {
    /// Password from the config file, then from `LOADER_DB_PASSWORD`.
    pub fn resolve_password(&self) -> Option<String> {
        self.password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
    }
}

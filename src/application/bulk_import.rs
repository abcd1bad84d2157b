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

//! # External Bulk-Import Adapter
//!
//! Alternate load path that hands a whole file to an external import tool
//! (dbatools `Import-DbaCsv` by default) instead of streaming it through the
//! in-process loader. The tool runs under the caller's OS identity, so no
//! credentials appear on the command line.
//!
//! The command line is built as discrete arguments, rendered once into a
//! script, and passed to the shell as `-EncodedCommand <base64 of UTF-16LE>`
//! so paths and delimiters never go through shell parsing.

use crate::config::ImportConfig;
use crate::domain::entities::{DatabaseTarget, ImportCommand, ImportResult};
use crate::domain::errors::{LoaderError, Result};
use crate::ports::command_port::CommandPort;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, error, info};
use std::sync::Arc;

/// One named parameter of the import tool, with or without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportArgument {
    /// `-Name 'value'`
    Value(&'static str, String),
    /// `-Name "value"`, for the delimiter.
    Quoted(&'static str, String),
    /// `-Name`
    Switch(&'static str),
}

impl ImportArgument {
    fn render(&self) -> String {
        match self {
            ImportArgument::Value(name, value) => format!("-{} {}", name, single_quoted(value)),
            ImportArgument::Quoted(name, value) => format!("-{} {}", name, double_quoted(value)),
            ImportArgument::Switch(name) => format!("-{}", name),
        }
    }
}

/// PowerShell verbatim literal: only `'` needs doubling.
fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '`' | '$' | '"') {
            out.push('`');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl ImportCommand {
    pub fn arguments(&self) -> Vec<ImportArgument> {
        let mut args = vec![
            ImportArgument::Value("Path", self.source.clone()),
            ImportArgument::Value("SqlInstance", self.server.clone()),
            ImportArgument::Value("Database", self.database.clone()),
            ImportArgument::Value("Table", self.target.clone()),
            ImportArgument::Value("Schema", self.schema.clone()),
        ];
        if self.truncate {
            args.push(ImportArgument::Switch("Truncate"));
        }
        args.push(ImportArgument::Quoted("Delimiter", self.delimiter.to_string()));
        args.push(ImportArgument::Switch("AutoCreateTable"));
        args.push(ImportArgument::Switch("EnableException"));
        args
    }

    /// The single script line the shell will run.
    pub fn script(&self, tool: &str) -> String {
        let mut line = tool.to_string();
        for arg in self.arguments() {
            line.push(' ');
            line.push_str(&arg.render());
        }
        line
    }
}

/// Base64 of the UTF-16LE bytes, the form `-EncodedCommand` expects.
pub fn encode_command(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

pub struct BulkImportAdapter {
    runner: Arc<dyn CommandPort>,
    target: DatabaseTarget,
    config: ImportConfig,
}

impl BulkImportAdapter {
    pub fn new(runner: Arc<dyn CommandPort>, target: DatabaseTarget, config: ImportConfig) -> Self {
        Self {
            runner,
            target,
            config,
        }
    }

    pub fn command(&self, source: &str, target: &str, delimiter: char, truncate: bool) -> ImportCommand {
        ImportCommand {
            source: source.to_string(),
            server: self
                .config
                .sql_instance
                .clone()
                .unwrap_or_else(|| self.target.server.clone()),
            database: self
                .config
                .database
                .clone()
                .unwrap_or_else(|| self.target.database.clone()),
            target: target.to_string(),
            schema: self.target.schema.clone(),
            delimiter,
            truncate,
        }
    }

    /// Runs the import tool once and waits for it. A nonzero exit becomes
    /// `ImportAdapterError` with the tool's stderr untouched.
    pub fn import_file(
        &self,
        source: &str,
        target: &str,
        delimiter: char,
        truncate: bool,
    ) -> Result<ImportResult> {
        let command = self.command(source, target, delimiter, truncate);
        let script = command.script(&self.config.tool);
        debug!("Import script: {}", script);

        let args = vec!["-EncodedCommand".to_string(), encode_command(&script)];
        info!("Importing {} into {}.{}", source, self.target.schema, target);
        let result = self.runner.run(&self.config.shell, &args)?;

        if !result.success() {
            error!("{} exited with code {}", self.config.tool, result.exit_code);
            return Err(LoaderError::ImportAdapterError {
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }
        info!("{}", result.stdout);
        Ok(result)
    }
}

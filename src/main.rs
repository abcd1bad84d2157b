//! # Staged Bulk Loader CLI
//!
//! Thin entry point: builds an `AppConfig` from a file and/or flags, wires
//! the runtime, runs one subcommand, and prints its result as JSON.

use clap::Parser;
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use staged_bulk_loader::application::runtime::RuntimeContext;
use staged_bulk_loader::application::spatial_query::{QueryOutput, SpatialRowSet};
use staged_bulk_loader::config::{parse_delimiter, Action, AppConfig, CliArgs};
use staged_bulk_loader::domain::errors::{LoaderError, Result};
use std::process;
use wkt::ToWkt;

fn main() {
    // 1. Initialize Logging
    env_logger::init();

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Load Config
    let mut config = if let Some(config_path) = &args.config {
        match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        }
    } else {
        AppConfig::from_cli(&args)
    };

    // Merge CLI overrides
    config.merge_cli(&args);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    // 4. Wire components and run
    let outcome = RuntimeContext::init(&config).and_then(|ctx| run(&ctx, &args.action));
    match outcome {
        Ok(report) => println!("{}", report),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

fn run(ctx: &RuntimeContext, action: &Action) -> Result<serde_json::Value> {
    match action {
        Action::Load {
            table,
            file,
            capture_time,
            capture_column,
        } => {
            let mut options = ctx.load_options()?;
            if *capture_time {
                let column = capture_column
                    .clone()
                    .unwrap_or_else(|| ctx.config.loader.capture_timestamp_column.clone());
                options = options.with_capture_timestamp(&column);
            }
            let summary = ctx.loader.load_file(&ctx.target.table(table), file, &options)?;
            info!("Loaded {} rows into {}", summary.total_rows, summary.table);
            to_json(&summary)
        }
        Action::Merge { table, file } => {
            let mut coordinator = ctx.merge_coordinator();
            let outcome = coordinator.merge_file(table, file, &ctx.load_options()?)?;
            to_json(&outcome)
        }
        Action::Check {
            sources,
            metadata_columns,
        } => {
            let results = ctx.drift_detector()?.check_schemas(sources, metadata_columns)?;
            to_json(&results)
        }
        Action::Import {
            table,
            file,
            truncate,
        } => {
            let delimiter = parse_delimiter(&ctx.config.loader.delimiter)? as char;
            let result = ctx.bulk_import().import_file(
                &file.display().to_string(),
                table,
                delimiter,
                *truncate,
            )?;
            Ok(json!({ "table": table, "exit_code": result.exit_code }))
        }
        Action::Truncate { table } => {
            let truncated = ctx.loader.truncate_table(&ctx.target.table(table))?;
            Ok(json!({ "table": table, "truncated": truncated }))
        }
        Action::Query {
            sql,
            geometry_column,
        } => {
            let service = ctx.query_service();
            let output = match geometry_column {
                Some(column) => QueryOutput::Spatial(service.select_spatial(sql, column)?),
                None => service.select(sql)?,
            };
            match output {
                QueryOutput::Rows(rows) => to_json(&rows),
                QueryOutput::Spatial(spatial) => Ok(spatial_json(&spatial)),
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| LoaderError::ConfigError(e.to_string()))
}

fn spatial_json(spatial: &SpatialRowSet) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = spatial
        .rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            for (column, value) in spatial.columns.iter().zip(&row.values) {
                object.insert(column.clone(), json!(value));
            }
            object.insert(
                spatial.geometry_field.clone(),
                json!(row.geometry.as_ref().map(|g| g.wkt_string())),
            );
            serde_json::Value::Object(object)
        })
        .collect();
    json!({ "crs": spatial.crs, "rows": rows })
}

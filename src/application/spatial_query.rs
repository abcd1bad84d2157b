//! # Geometry-aware queries
//!
//! The base row fetch returns text. A `GeometryDecoder` is an optional
//! post-processing stage that parses one well-known-text column into a
//! `geo_types::Geometry`, drops the text column, and tags the result with a
//! fixed reference system (EPSG:4326 unless configured otherwise).
//!
//! `QueryService` composes the two: configuration decides whether the
//! decoder runs, not the type of the service.

use crate::config::GeometryConfig;
use crate::domain::entities::RowSet;
use crate::domain::errors::{LoaderError, Result};
use crate::infrastructure::oracle::sql_utils::normalize_identifier;
use crate::ports::sql_port::SqlPort;
use geo_types::Geometry;
use log::info;
use std::sync::Arc;
use wkt::TryFromWkt;

pub const DEFAULT_GEOMETRY_FIELD: &str = "geometry";
pub const DEFAULT_CRS: &str = "EPSG:4326";

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRow {
    /// Values of the non-geometry columns, in `SpatialRowSet::columns` order.
    pub values: Vec<Option<String>>,
    /// `None` when the source value was NULL.
    pub geometry: Option<Geometry<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRowSet {
    /// Attribute columns; the WKT source column is not among them.
    pub columns: Vec<String>,
    /// Name the geometry is exposed under.
    pub geometry_field: String,
    pub crs: String,
    pub rows: Vec<SpatialRow>,
}

#[derive(Debug, Clone)]
pub struct GeometryDecoder {
    column: String,
    field: String,
    crs: String,
}

impl GeometryDecoder {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            field: DEFAULT_GEOMETRY_FIELD.to_string(),
            crs: DEFAULT_CRS.to_string(),
        }
    }

    pub fn from_config(config: &GeometryConfig) -> Self {
        Self {
            column: config.column.clone(),
            field: config.field.clone(),
            crs: config.crs.clone(),
        }
    }

    pub fn decode(&self, rows: RowSet) -> Result<SpatialRowSet> {
        // Unquoted aliases come back folded to upper case.
        let wanted = normalize_identifier(&self.column);
        let index = rows
            .column_index(&self.column)
            .or_else(|| rows.columns.iter().position(|c| normalize_identifier(c) == wanted))
            .ok_or_else(|| {
                LoaderError::ConfigError(format!(
                    "geometry column {} is not in the query result {:?}",
                    self.column, rows.columns
                ))
            })?;

        let columns = rows
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, c)| c.clone())
            .collect();

        let mut decoded = Vec::with_capacity(rows.rows.len());
        for (row_number, mut values) in rows.rows.into_iter().enumerate() {
            let geometry = match values.remove(index) {
                Some(text) => Some(Geometry::<f64>::try_from_wkt_str(&text).map_err(|e| {
                    LoaderError::GeometryError {
                        row: row_number + 1,
                        reason: format!("{} in '{}'", e, text),
                    }
                })?),
                None => None,
            };
            decoded.push(SpatialRow { values, geometry });
        }

        Ok(SpatialRowSet {
            columns,
            geometry_field: self.field.clone(),
            crs: self.crs.clone(),
            rows: decoded,
        })
    }
}

/// Result of `QueryService::select`: plain rows, or rows with geometry when
/// a decoder is configured.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(RowSet),
    Spatial(SpatialRowSet),
}

pub struct QueryService {
    sql: Arc<dyn SqlPort>,
    geometry: Option<GeometryDecoder>,
}

impl QueryService {
    pub fn new(sql: Arc<dyn SqlPort>, geometry: Option<GeometryDecoder>) -> Self {
        Self { sql, geometry }
    }

    pub fn from_config(sql: Arc<dyn SqlPort>, geometry: Option<&GeometryConfig>) -> Self {
        Self::new(sql, geometry.map(GeometryDecoder::from_config))
    }

    pub fn select(&self, query: &str) -> Result<QueryOutput> {
        let rows = self.sql.query(query)?;
        match &self.geometry {
            Some(decoder) => Ok(QueryOutput::Spatial(decoder.decode(rows)?)),
            None => Ok(QueryOutput::Rows(rows)),
        }
    }

    /// Runs `query` and decodes `geometry_column`, regardless of configuration.
    pub fn select_spatial(&self, query: &str, geometry_column: &str) -> Result<SpatialRowSet> {
        let decoder = match &self.geometry {
            Some(configured) if configured.column == geometry_column => configured.clone(),
            _ => GeometryDecoder::new(geometry_column),
        };
        let rows = self.sql.query(query)?;
        let spatial = decoder.decode(rows)?;
        info!(
            "Decoded {} rows with {} as {} ({})",
            spatial.rows.len(),
            geometry_column,
            spatial.geometry_field,
            spatial.crs
        );
        Ok(spatial)
    }
}

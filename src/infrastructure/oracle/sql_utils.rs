//! Utility functions for generating Oracle SQL text.
//!
//! Simple identifiers (`sales`, `COL1`, `batch_date`) are emitted unquoted so
//! Oracle folds them to upper case and matches them case-insensitively.
//! Anything else (spaces, punctuation, a leading digit) is double-quoted and
//! therefore matched exactly.

use crate::domain::entities::TableRef;

const MAX_IDENTIFIER_LEN: usize = 128;

/// True for identifiers Oracle accepts without quotes.
pub fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.len() <= MAX_IDENTIFIER_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '#')
}

/// Renders an identifier for use in SQL text.
pub fn render_identifier(name: &str) -> String {
    if is_simple_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// The form Oracle stores an identifier in its dictionary views.
pub fn normalize_identifier(name: &str) -> String {
    if is_simple_identifier(name) {
        name.to_uppercase()
    } else {
        name.to_string()
    }
}

pub fn qualified_name(schema: &str, name: &str) -> String {
    format!("{}.{}", render_identifier(schema), render_identifier(name))
}

/// `INSERT INTO schema.table (c1, c2) VALUES (:1, :2)`
pub fn build_insert_sql(table: &TableRef, columns: &[String]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| render_identifier(c)).collect();
    let binds: Vec<String> = (1..=columns.len()).map(|i| format!(":{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_name(&table.schema, &table.table),
        cols.join(", "),
        binds.join(", ")
    )
}

pub fn build_count_sql(table: &TableRef) -> String {
    format!(
        "SELECT COUNT(*) FROM {}",
        qualified_name(&table.schema, &table.table)
    )
}

pub fn build_delete_sql(table: &TableRef) -> String {
    format!("DELETE FROM {}", qualified_name(&table.schema, &table.table))
}

/// Anonymous block calling `schema.procedure` with one bind argument.
pub fn build_procedure_call(schema: &str, procedure: &str) -> String {
    format!("BEGIN {}(:1); END;", qualified_name(schema, procedure))
}

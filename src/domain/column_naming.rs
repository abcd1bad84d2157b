//! Positional column naming used by the server-side merge procedure.
//!
//! The merge procedure reads its column mapping from metadata keyed by
//! position, so staged columns are named `COL1`, `COL2`, ... in file order.

/// Prefix shared by every positional column name.
pub const POSITIONAL_PREFIX: &str = "COL";

/// Renames an ordered column list to `COL1..COLn`, 1-indexed, keeping order.
pub fn format_merge_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    (1..=columns.len())
        .map(|i| format!("{}{}", POSITIONAL_PREFIX, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_merge_columns() {
        let renamed = format_merge_columns(&["name", "age", "city"]);
        assert_eq!(renamed, vec!["COL1", "COL2", "COL3"]);
    }

    #[test]
    fn test_format_merge_columns_empty() {
        let none: [&str; 0] = [];
        assert!(format_merge_columns(&none).is_empty());
    }
}

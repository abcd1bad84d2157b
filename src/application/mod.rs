pub mod bulk_import;
pub mod runtime;
pub mod schema_check;
pub mod spatial_query;
pub mod staged_merge;
pub mod table_loader;

#[cfg(test)]
pub(crate) mod test_support;

pub mod connection_manager;
pub mod connection_provider;
pub mod oracle_adapter;
pub mod sql_utils;

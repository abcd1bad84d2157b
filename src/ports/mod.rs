pub mod command_port;
pub mod metadata_port;
pub mod sql_port;

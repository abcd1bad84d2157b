pub mod delimited;
pub mod oracle;
pub mod process;

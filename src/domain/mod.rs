pub mod column_naming;
pub mod entities;
pub mod errors;

//! # Staged Bulk Loader
//!
//! Moves large delimited files into Oracle tables without trusting them:
//! files stream in bounded chunks, headers are checked against the live
//! tables before anything is written, and merges go through an empty
//! staging table and a server-side procedure so a failed load never leaves
//! the target half-written. An external bulk-import tool can be used as an
//! alternate path.
//!
//! The crate follows the **Hexagonal Architecture** (Ports and Adapters):
//! the services in `application` only see the traits in `ports`.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

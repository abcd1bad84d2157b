//! Connection Provider: owns the pooled connections for one
//! server + database + schema triple.
//!
//! Adapters borrow a pooled connection for the length of a single operation;
//! it goes back to the pool when the borrow is dropped.

use crate::config::DatabaseConfig;
use crate::domain::entities::DatabaseTarget;
use crate::domain::errors::Result;
use crate::infrastructure::oracle::connection_manager::{Credentials, OracleConnectionManager};
use log::info;
use r2d2::{Pool, PooledConnection};

const DEFAULT_POOL_SIZE: u32 = 2;

pub struct ConnectionProvider {
    pool: Pool<OracleConnectionManager>,
}

impl ConnectionProvider {
    /// Builds the pool and opens its first connections.
    pub fn connect(config: &DatabaseConfig, target: &DatabaseTarget) -> Result<Self> {
        let conn_str = target.connect_string();
        let credentials = credentials_for(config);
        let mode = match credentials {
            Credentials::External => "external authentication",
            Credentials::Password { .. } => "password authentication",
        };
        info!("Initializing connection pool for {} ({})...", conn_str, mode);

        let manager = OracleConnectionManager::new(credentials, &conn_str);
        let pool = Pool::builder()
            .max_size(config.pool_size.unwrap_or(DEFAULT_POOL_SIZE).max(1))
            .build(manager)?;

        Ok(Self { pool })
    }

    pub fn get_conn(&self) -> Result<PooledConnection<OracleConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

/// A configured username selects password auth; otherwise the connection is
/// credentials-free.
pub fn credentials_for(config: &DatabaseConfig) -> Credentials {
    match &config.username {
        Some(user) if !user.is_empty() => Credentials::Password {
            user: user.clone(),
            pass: config.resolve_password().unwrap_or_default(),
        },
        _ => Credentials::External,
    }
}

// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use oracle::{Connection, Connector, Error};
use r2d2::ManageConnection;

/// How the pool authenticates against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OS / wallet authentication; no secrets leave the host.
    External,
    Password { user: String, pass: String },
}

/// Custom R2D2 connection manager for Oracle.
#[derive(Debug)]
pub struct OracleConnectionManager {
    credentials: Credentials,
    conn_str: String,
}

impl OracleConnectionManager {
    pub fn new(credentials: Credentials, conn_str: &str) -> Self {
        Self {
            credentials,
            conn_str: conn_str.to_string(),
        }
    }
}

impl ManageConnection for OracleConnectionManager {
    type Connection = Connection;
    type Error = Error;

    fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        match &self.credentials {
            Credentials::External => Connector::new("", "", &self.conn_str)
                .external_auth(true)
                .connect(),
            Credentials::Password { user, pass } => Connection::connect(user, pass, &self.conn_str),
        }
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.ping()
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

//! Configuration type definitions.
//!
//! The on-disk format is the `dataSource.json` file the tool has always
//! read: a flat JSON object with camelCase keys describing the source
//! database, plus an optional `destination` object consumed only by the
//! bulk-load emitter. Unknown keys are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration structure, parsed from `dataSource.json`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database connection settings (top-level keys).
    #[serde(flatten)]
    pub source: SourceConfig,

    /// Destination database for the bulk-load emitter. When absent, the
    /// `\copy FROM` commands are recorded but not executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<DestinationConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .finish()
    }
}

/// Source database connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub db_name: String,

    /// Username.
    pub username: String,

    /// Password.
    pub password: String,

    /// Whether the client negotiates TLS (default: false).
    #[serde(default)]
    pub ssl_enabled: bool,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("ssl_enabled", &self.ssl_enabled)
            .finish()
    }
}

/// Destination database settings for the bulk-load emitter.
///
/// The emitter never opens a driver connection to the destination; these
/// values parameterize the spawned psql-compatible client.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub db_name: String,

    /// Username.
    pub username: String,

    /// Password, passed to the client via `PGPASSWORD`.
    pub password: String,
}

impl fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn default_pg_port() -> u16 {
    5432
}

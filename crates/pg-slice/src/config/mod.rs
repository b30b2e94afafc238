//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{Result, SliceError};
use std::path::Path;

impl Config {
    /// Load configuration from a `dataSource.json`-style file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SliceError::Config(format!("cannot read config file {:?}: {}", path, e))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| SliceError::Config(format!("failed to parse JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_JSON: &str = r#"{
  "host": "localhost",
  "port": 5432,
  "dbName": "app_development",
  "username": "postgres",
  "password": "postgres",
  "sslEnabled": false
}"#;

    #[test]
    fn from_json_valid() {
        let config = Config::from_json(VALID_JSON).unwrap();
        assert_eq!(config.source.host, "localhost");
        assert_eq!(config.source.port, 5432);
        assert_eq!(config.source.db_name, "app_development");
        assert_eq!(config.source.username, "postgres");
        assert!(!config.source.ssl_enabled);
        assert!(config.destination.is_none());
    }

    #[test]
    fn from_json_defaults_port_and_ssl() {
        let json = r#"{
          "host": "db.internal",
          "dbName": "app",
          "username": "ro",
          "password": "secret"
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.source.port, 5432);
        assert!(!config.source.ssl_enabled);
    }

    #[test]
    fn from_json_ignores_unknown_keys() {
        let json = r#"{
          "host": "localhost",
          "dbName": "app",
          "username": "postgres",
          "password": "postgres",
          "poolSize": 12,
          "comment": "left over from an older version"
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.source.host, "localhost");
    }

    #[test]
    fn from_json_with_destination() {
        let json = r#"{
          "host": "localhost",
          "dbName": "app",
          "username": "postgres",
          "password": "postgres",
          "destination": {
            "host": "localhost",
            "port": 5433,
            "dbName": "postgres",
            "username": "postgres",
            "password": "postgres"
          }
        }"#;
        let config = Config::from_json(json).unwrap();
        let dest = config.destination.unwrap();
        assert_eq!(dest.port, 5433);
        assert_eq!(dest.db_name, "postgres");
    }

    #[test]
    fn from_json_invalid_syntax() {
        let result = Config::from_json(r#"{ "host": not json }"#);
        assert!(matches!(result, Err(SliceError::Config(_))));
    }

    #[test]
    fn from_json_missing_required_field() {
        let result = Config::from_json(r#"{ "host": "localhost" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn from_json_rejects_empty_host() {
        let json = r#"{
          "host": "",
          "dbName": "app",
          "username": "postgres",
          "password": "postgres"
        }"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(VALID_JSON.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source.db_name, "app_development");
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let result = Config::load("/nonexistent/dataSource.json");
        assert!(matches!(result, Err(SliceError::Config(_))));
    }

    #[test]
    fn debug_redacts_password() {
        let config = Config::from_json(VALID_JSON).unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("password: \"postgres\""));
    }
}

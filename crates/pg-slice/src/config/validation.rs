//! Configuration validation.

use super::{Config, DestinationConfig, SourceConfig};
use crate::error::{Result, SliceError};

/// Validate a loaded configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_source(&config.source)?;
    if let Some(ref dest) = config.destination {
        validate_destination(dest)?;
    }
    Ok(())
}

fn validate_source(source: &SourceConfig) -> Result<()> {
    if source.host.is_empty() {
        return Err(SliceError::Config("source host must not be empty".into()));
    }
    if source.port == 0 {
        return Err(SliceError::Config("source port must not be 0".into()));
    }
    if source.db_name.is_empty() {
        return Err(SliceError::Config(
            "source dbName must not be empty".into(),
        ));
    }
    if source.username.is_empty() {
        return Err(SliceError::Config(
            "source username must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_destination(dest: &DestinationConfig) -> Result<()> {
    if dest.host.is_empty() {
        return Err(SliceError::Config(
            "destination host must not be empty".into(),
        ));
    }
    if dest.port == 0 {
        return Err(SliceError::Config("destination port must not be 0".into()));
    }
    if dest.db_name.is_empty() {
        return Err(SliceError::Config(
            "destination dbName must not be empty".into(),
        ));
    }
    if dest.username.is_empty() {
        return Err(SliceError::Config(
            "destination username must not be empty".into(),
        ));
    }
    Ok(())
}

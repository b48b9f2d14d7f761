//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &mut Config) -> Result<()> {
    if config.source.trim().is_empty() {
        return Err(MigrateError::Config(
            "missing source DSN (flag, config file or SOURCE_DSN)".into(),
        ));
    }
    if config.targets.is_empty() {
        return Err(MigrateError::Config(
            "missing at least one target DSN".into(),
        ));
    }
    for (idx, target) in config.targets.iter().enumerate() {
        if target.dsn.trim().is_empty() {
            return Err(MigrateError::Config(format!(
                "targets[{}] ({}) has an empty dsn",
                idx, target.name
            )));
        }
    }
    if config.connect_timeout_secs == 0 {
        return Err(MigrateError::Config(
            "connect_timeout_secs must be at least 1".into(),
        ));
    }

    if config.concurrency == 0 {
        config.concurrency = 1;
    }

    Ok(())
}

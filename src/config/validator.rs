use crate::config::{Config, ShoutcastSettings};
use crate::error::{Error, Result};

/// Validates process launch settings
pub fn validate_shoutcast_settings(settings: &ShoutcastSettings) -> Result<()> {
    if !settings.bin_path.is_file() {
        return Err(Error::ConfigInvalid(format!(
            "Invalid SHOUTcast server bin: {}",
            settings.bin_path.display()
        )));
    }

    if !settings.configs_dir.is_dir() {
        return Err(Error::ConfigInvalid(format!(
            "Invalid server configs directory: {}",
            settings.configs_dir.display()
        )));
    }

    if !settings.working_dir.is_dir() {
        return Err(Error::ConfigInvalid(format!(
            "Invalid working directory: {}",
            settings.working_dir.display()
        )));
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &Config) -> Result<()> {
    if config.address.is_empty() {
        return Err(Error::ConfigInvalid("Empty bind address".to_string()));
    }

    if config.workers == Some(0) {
        return Err(Error::ConfigInvalid(
            "workers must be at least 1".to_string(),
        ));
    }

    validate_shoutcast_settings(&config.shoutcast)?;

    Ok(())
}

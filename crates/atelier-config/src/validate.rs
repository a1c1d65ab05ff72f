//! Configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first offending field.
pub(crate) fn validate(config: &Config) -> ConfigResult<()> {
    if config.browser.max_age_secs == 0 {
        return Err(ConfigError::Invalid(
            "browser.max_age_secs must be greater than zero".into(),
        ));
    }
    if config.browser.sweep_interval_secs == 0 {
        return Err(ConfigError::Invalid(
            "browser.sweep_interval_secs must be greater than zero".into(),
        ));
    }
    if config.jobs.collection.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "jobs.collection must not be empty".into(),
        ));
    }
    if config.jobs.audit_collection.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "jobs.audit_collection must not be empty".into(),
        ));
    }
    if config.sandbox.root.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("sandbox.root must not be empty".into()));
    }
    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "logging.level must not be empty".into(),
        ));
    }
    match config.logging.format.as_str() {
        "pretty" | "compact" | "json" => {},
        other => {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be pretty, compact, or json (got {other:?})"
            )));
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn zero_max_age_rejected() {
        let mut config = Config::default();
        config.browser.max_age_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn empty_collection_rejected() {
        let mut config = Config::default();
        config.jobs.collection = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "verbose".into();
        assert!(validate(&config).is_err());
    }
}

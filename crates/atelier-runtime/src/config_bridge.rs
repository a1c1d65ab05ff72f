//! Bridges configuration sections into their domain forms.

use atelier_config::Config;
use atelier_telemetry::{LogConfig, LogFormat, TelemetryResult, setup_logging};

/// Build a [`LogConfig`] from the `[logging]` section.
///
/// # Errors
///
/// Returns a telemetry error if the configured format is unknown (the
/// config validator normally catches this first).
pub fn log_config(config: &Config) -> TelemetryResult<LogConfig> {
    let format: LogFormat = config.logging.format.parse()?;
    let mut log = LogConfig::new(&config.logging.level).with_format(format);
    for directive in &config.logging.directives {
        log = log.with_directive(directive);
    }
    Ok(log)
}

/// Install the global tracing subscriber described by the `[logging]`
/// section. Call once, from the host process entry point.
///
/// # Errors
///
/// Returns a telemetry error if the level, format, or a directive does not
/// parse, or if a subscriber is already installed.
pub fn init_logging(config: &Config) -> TelemetryResult<()> {
    setup_logging(&log_config(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridges_level_and_format() {
        let mut config = Config::default();
        config.logging.level = "debug".into();
        config.logging.format = "json".into();
        config.logging.directives = vec!["atelier_jobs=trace".into()];

        assert!(log_config(&config).is_ok());
    }

    #[test]
    fn unknown_format_is_an_error() {
        let mut config = Config::default();
        config.logging.format = "verbose".into();
        assert!(log_config(&config).is_err());
    }
}

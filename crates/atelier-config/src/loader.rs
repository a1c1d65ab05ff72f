//! Config file loading and environment overrides.
//!
//! The `Config::load()` algorithm:
//! 1. Start from built-in defaults
//! 2. Merge the TOML file at the given path, if present
//! 3. Apply `ATELIER_*` environment overrides
//! 4. Validate

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

impl Config {
    /// Load configuration, optionally merging a TOML file.
    ///
    /// A missing file is not an error; defaults apply. Recognized
    /// environment overrides: `ATELIER_LOG` (level),
    /// `ATELIER_SANDBOX_ROOT`, and `ATELIER_STORAGE_PATH`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or if the final configuration fails validation.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
                        path: path.display().to_string(),
                        source,
                    })?;
                let parsed: Self =
                    toml::from_str(&raw).map_err(|source| ConfigError::ParseError {
                        path: path.display().to_string(),
                        source,
                    })?;
                info!(path = %path.display(), "loaded config file");
                parsed
            },
            Some(path) => {
                debug!(path = %path.display(), "config file absent, using defaults");
                Self::default()
            },
            None => Self::default(),
        };

        config.apply_env_overrides();
        validate::validate(&config)?;
        Ok(config)
    }

    /// Apply `ATELIER_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("ATELIER_LOG")
            && !level.is_empty()
        {
            self.logging.level = level;
        }
        if let Ok(root) = std::env::var("ATELIER_SANDBOX_ROOT")
            && !root.is_empty()
        {
            self.sandbox.root = root.into();
        }
        if let Ok(path) = std::env::var("ATELIER_STORAGE_PATH")
            && !path.is_empty()
        {
            self.storage.path = path.into();
        }
    }
}

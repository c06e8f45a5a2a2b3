//! # Application Configuration
//!
//! Layered configuration for the `badc` driver. Sources, lowest priority first:
//! 1. the embedded defaults passed to [`AppConfig::init`],
//! 2. `BADC_*` environment variables,
//! 3. a configuration file given with `--config`,
//! 4. command-line flags merged with [`AppConfig::merge_args`].
//!
//! The builder lives behind a global lock so every command can call
//! [`AppConfig::fetch`] without threading a value through.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;

use super::error::{Error, Result};
use crate::core::state::VerbosityLevel;
use crate::utils::types::LogLevel;

/// Smallest and largest machine word, in bytes.
pub const MIN_WORD_SIZE: u8 = 1;
pub const MAX_WORD_SIZE: u8 = 16;

lazy_static! {
    static ref BUILDER: RwLock<ConfigBuilder<DefaultState>> = RwLock::new(Config::builder());
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub debug: bool,
    pub log_level: LogLevel,
    /// Default verbosity for every compiler stage.
    pub verbosity: VerbosityLevel,
    /// Machine word size in bytes; bounds integer and character constants.
    pub word_size: u8,
}

impl AppConfig {
    /// Initialize AppConfig.
    pub fn init(default_config: Option<&str>) -> Result<()> {
        let mut builder = Config::builder();

        // Embed file into executable
        // This macro will embed the configuration file into the
        // executable. Check include_str! for more info.
        if let Some(config_contents) = default_config {
            builder = builder.add_source(config::File::from_str(
                config_contents,
                config::FileFormat::Toml,
            ));
        }

        // Merge settings with env variables
        builder = builder.add_source(Environment::with_prefix("BADC"));

        // Save Config to RwLoc
        {
            let mut w = BUILDER.write()?;
            *w = builder;
        }

        Ok(())
    }

    /// Merge the command-line overrides into the configuration.
    pub fn merge_args(app: clap::ArgMatches) -> Result<()> {
        if let Some(value) = app.get_one::<bool>("debug") {
            AppConfig::set("debug", &value.to_string())?;
        }

        if let Some(value) = app.get_one::<LogLevel>("log_level") {
            AppConfig::set("log_level", &value.to_string())?;
        }

        if let Some(value) = app.get_one::<VerbosityLevel>("verbosity") {
            AppConfig::set("verbosity", &value.to_string())?;
        }

        if let Some(value) = app.get_one::<u8>("word_size") {
            AppConfig::set("word_size", &value.to_string())?;
        }

        Ok(())
    }

    /// Merge a configuration file into the builder.
    pub fn merge_config(config_file: Option<&Path>) -> Result<()> {
        if let Some(config_file_path) = config_file {
            let path = config_file_path
                .to_str()
                .ok_or_else(|| Error::new("configuration path is not valid UTF-8"))?;
            let mut w = BUILDER.write()?;
            *w = w.clone().add_source(config::File::with_name(path));
        }
        Ok(())
    }

    /// Set a single configuration value, overriding every other source.
    pub fn set(key: &str, value: &str) -> Result<()> {
        let mut w = BUILDER.write()?;
        *w = w.clone().set_override(key, value)?;
        Ok(())
    }

    /// Get a single configuration value.
    pub fn get<T>(key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(BUILDER.read()?.clone().build()?.get::<T>(key)?)
    }

    /// Build and deserialize the full configuration.
    ///
    /// Fails when `word_size` is outside 1..=16 bytes, whichever source set it.
    pub fn fetch() -> Result<AppConfig> {
        let r = BUILDER.read()?;
        let config_clone = r.clone().build()?;
        let app_config: AppConfig = config_clone.try_deserialize()?;
        if !(MIN_WORD_SIZE..=MAX_WORD_SIZE).contains(&app_config.word_size) {
            return Err(Error::new(&format!(
                "word_size must be between {} and {}, got {}",
                MIN_WORD_SIZE, MAX_WORD_SIZE, app_config.word_size
            )));
        }
        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &str = r#"
debug = false
log_level = "info"
verbosity = "silent"
word_size = 8
"#;

    // The builder is global; keep everything touching it in one test.
    #[test]
    fn test_init_set_and_fetch() -> Result<()> {
        AppConfig::init(Some(DEFAULTS))?;

        let config = AppConfig::fetch()?;
        assert!(!config.debug);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.verbosity, VerbosityLevel::Silent);
        assert_eq!(config.word_size, 8);

        AppConfig::set("verbosity", "debug")?;
        AppConfig::set("word_size", "4")?;
        let config = AppConfig::fetch()?;
        assert_eq!(config.verbosity, VerbosityLevel::Debug);
        assert_eq!(AppConfig::get::<u8>("word_size")?, 4);

        for bad_size in ["0", "17", "40"] {
            AppConfig::set("word_size", bad_size)?;
            let err = AppConfig::fetch().unwrap_err();
            assert!(err.to_string().starts_with("word_size must be between 1 and 16"));
        }
        AppConfig::set("word_size", "16")?;
        assert_eq!(AppConfig::fetch()?.word_size, 16);

        Ok(())
    }
}

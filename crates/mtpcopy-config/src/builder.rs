//! Layered configuration loading
//!
//! Built-in defaults are always the bottom layer. Files and environment
//! variables are applied on top in the order they were added.

use crate::format::ConfigFormat;
use crate::{Config, ConfigError, ConfigResult};
use config::{Environment, File};
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Separator between a prefix and nested keys in environment variables
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone)]
enum Layer {
    File { path: PathBuf, required: bool },
    Env { prefix: String },
}

/// Builds a [`Config`] from defaults, files and the environment
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    layers: Vec<Layer>,
}

impl ConfigBuilder {
    /// Start from the built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer a file on top if it exists
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Layer a file on top, failing the build if it is missing
    pub fn add_required_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Layer `PREFIX__SECTION__KEY` environment variables on top
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.layers.push(Layer::Env {
            prefix: prefix.into(),
        });
        self
    }

    /// Merge the layers, deserialize and validate
    pub fn build(self) -> ConfigResult<Config> {
        let mut merged =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        for layer in self.layers {
            merged = match layer {
                Layer::File { path, required } => {
                    let format = ConfigFormat::from_path(&path).file_format();
                    merged.add_source(File::from(path).format(format).required(required))
                }
                Layer::Env { prefix } => merged.add_source(
                    Environment::with_prefix(&prefix)
                        .prefix_separator(ENV_SEPARATOR)
                        .separator(ENV_SEPARATOR),
                ),
            };
        }

        let config: Config = merged.build()?.try_deserialize()?;
        validate(&config)?;
        Ok(config)
    }
}

/// Check settings that deserialization alone cannot
///
/// Naming patterns are validated while deserializing.
fn validate(config: &Config) -> ConfigResult<()> {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::invalid(
            "logging.level",
            format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config
        .device
        .mount_root
        .as_ref()
        .is_some_and(|root| root.as_os_str().is_empty())
    {
        return Err(ConfigError::invalid("device.mount_root", "must not be empty"));
    }

    Ok(())
}

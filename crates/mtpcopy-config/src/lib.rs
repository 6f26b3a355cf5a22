//! Configuration management system for mtpcopy
//!
//! This crate loads the mtpcopy configuration from layered sources: built-in
//! defaults, then a YAML, TOML or JSON file, then environment variables.
//!
//! # Features
//!
//! - **Multiple formats**: YAML, TOML and JSON files, detected from the extension
//! - **Validation**: naming patterns and log levels are checked on load
//! - **Environment overrides**: `MTPCOPY__TRANSFER__NAMING_PATTERN=...`
//! - **Defaults**: every option has a sensible default
//!
//! # Examples
//!
//! ```rust
//! use mtpcopy_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("mtpcopy.yaml")
//!     .add_env_prefix("MTPCOPY")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Naming pattern: {}", config.transfer.naming_pattern);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use mtpcopy_types::{CollisionPolicy, NamingPattern};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod builder;
pub mod error;
pub mod format;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use format::ConfigFormat;
pub use loader::ConfigLoader;

/// Main configuration structure for mtpcopy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Transfer behaviour
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Device discovery
    #[serde(default)]
    pub device: DeviceConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transfer behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Pattern used to name files that carry a capture time
    #[serde(default)]
    pub naming_pattern: NamingPattern,
    /// What to do when the target path is already taken
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    /// Rename JPEG files after their capture time
    #[serde(default = "default_rename_by_capture_time")]
    pub rename_by_capture_time: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            naming_pattern: NamingPattern::default(),
            collision_policy: CollisionPolicy::default(),
            rename_by_capture_time: default_rename_by_capture_time(),
        }
    }
}

fn default_rename_by_capture_time() -> bool {
    true
}

/// Device discovery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Directory whose sub-directories are mounted devices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_root: Option<PathBuf>,
}

impl DeviceConfig {
    /// The configured mount root, or the gvfs runtime directory when it exists
    pub fn effective_mount_root(&self) -> Option<PathBuf> {
        if let Some(root) = &self.mount_root {
            return Some(root.clone());
        }
        std::env::var_os("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join("gvfs"))
            .filter(|gvfs| gvfs.is_dir())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable JSON formatting
    pub json_format: bool,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            colored_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(
            config.transfer.naming_pattern.as_str(),
            "yyyy/MM/yyyy-MM-dd_HH-mm-ss"
        );
        assert_eq!(config.transfer.collision_policy, CollisionPolicy::Rename);
        assert!(config.transfer.rename_by_capture_time);
        assert!(config.device.mount_root.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_explicit_mount_root_wins() {
        let temp_dir = TempDir::new().unwrap();
        let device = DeviceConfig {
            mount_root: Some(temp_dir.path().to_path_buf()),
        };
        assert_eq!(
            device.effective_mount_root().as_deref(),
            Some(temp_dir.path())
        );
    }
}

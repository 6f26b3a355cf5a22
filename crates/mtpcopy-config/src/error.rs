//! Error types for configuration management

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file could not be read or written
    #[error("cannot access config file '{path}': {source}")]
    Io {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The layered sources could not be merged or deserialized
    #[error("cannot load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The configuration could not be rendered in the requested format
    #[error("cannot render configuration as {format}: {message}")]
    Render {
        /// Target format name
        format: &'static str,
        /// Serializer message
        message: String,
    },

    /// A setting has an unacceptable value
    #[error("invalid setting `{key}`: {message}")]
    Invalid {
        /// Dotted setting name, e.g. `logging.level`
        key: &'static str,
        /// What is wrong with the value
        message: String,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create an error for an invalid setting
    pub fn invalid<S: Into<String>>(key: &'static str, message: S) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for mtpcopy_types::Error {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtpcopy_types::ErrorKind;

    #[test]
    fn test_converts_into_core_config_error() {
        let error = mtpcopy_types::Error::from(ConfigError::invalid("logging.level", "loud"));
        assert_eq!(error.kind(), ErrorKind::Config);
        assert!(error.to_string().contains("logging.level"));
    }
}

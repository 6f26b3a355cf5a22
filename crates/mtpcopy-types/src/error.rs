//! Error types and handling for mtpcopy
//!
//! This module provides the error taxonomy shared by every mtpcopy crate.
//! Errors fall into two groups: preflight errors, which are detected before
//! any file is touched, and per-file errors, which abort the remainder of a
//! run and leave the staging directory behind.

use std::path::{Path, PathBuf};

/// Main error type for mtpcopy operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// The virtual path string is malformed
    #[error("Invalid virtual path '{path}': {reason}")]
    InvalidPath {
        /// Path as supplied by the caller
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// A path segment matched no folder, or more than one
    #[error("Directory not found on device: {path}")]
    DirectoryNotFound {
        /// Virtual path that failed to resolve
        path: String,
    },

    /// No device with the requested name is available
    #[error("Device not found: {name}")]
    DeviceNotFound {
        /// Device name or location that was requested
        name: String,
    },

    /// The local destination root does not exist or is not a directory
    #[error("Target root not found: {path}")]
    TargetRootNotFound {
        /// Destination root path
        path: PathBuf,
    },

    /// Reading from the device failed
    #[error("Transport error: {message}")]
    Transport {
        /// Error message from the device provider
        message: String,
    },

    /// A staged file with the same name already exists in this run
    #[error("Staging collision: {path}")]
    StagingCollision {
        /// Staged file path that already existed
        path: PathBuf,
    },

    /// The resolved target already exists and the policy forbids replacing it
    #[error("Destination already exists: {path}")]
    DestinationExists {
        /// Target path
        path: PathBuf,
    },

    /// A device-supplied name cannot be used as a local file name
    #[error("Unsafe file name from device: '{name}'")]
    UnsafeName {
        /// Offending name
        name: String,
    },

    /// Embedded metadata could not be decoded
    #[error("Metadata error: {message}")]
    Metadata {
        /// Decoder message
        message: String,
    },

    /// Local I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Malformed virtual path
    InvalidPath,
    /// Device-side directory missing or ambiguous
    DirectoryNotFound,
    /// Device missing
    DeviceNotFound,
    /// Local destination root missing
    TargetRootNotFound,
    /// Device read failure
    Transport,
    /// Duplicate staged file
    StagingCollision,
    /// Target path occupied
    DestinationExists,
    /// Device name rejected
    UnsafeName,
    /// Metadata decoding
    Metadata,
    /// Local disk failure
    Io,
    /// Configuration errors
    Config,
    /// Other errors
    Other,
}

impl ErrorKind {
    /// Process exit code a front-end should report for this kind
    pub fn exit_code(self) -> i32 {
        match self {
            Self::InvalidPath => 2,
            Self::DirectoryNotFound => 3,
            Self::DeviceNotFound => 4,
            Self::TargetRootNotFound => 5,
            Self::Transport => 6,
            Self::StagingCollision | Self::DestinationExists | Self::UnsafeName => 7,
            Self::Io | Self::Metadata => 8,
            Self::Config => 9,
            Self::Other => 1,
        }
    }
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::DirectoryNotFound { .. } => ErrorKind::DirectoryNotFound,
            Self::DeviceNotFound { .. } => ErrorKind::DeviceNotFound,
            Self::TargetRootNotFound { .. } => ErrorKind::TargetRootNotFound,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::StagingCollision { .. } => ErrorKind::StagingCollision,
            Self::DestinationExists { .. } => ErrorKind::DestinationExists,
            Self::UnsafeName { .. } => ErrorKind::UnsafeName,
            Self::Metadata { .. } => ErrorKind::Metadata,
            Self::Io { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Check whether this error is raised before any file is touched
    pub fn is_preflight(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidPath
                | ErrorKind::DirectoryNotFound
                | ErrorKind::DeviceNotFound
                | ErrorKind::TargetRootNotFound
        )
    }

    /// Create a new invalid path error
    pub fn invalid_path<S: Into<String>, R: Into<String>>(path: S, reason: R) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new directory not found error
    pub fn directory_not_found<S: Into<String>>(path: S) -> Self {
        Self::DirectoryNotFound { path: path.into() }
    }

    /// Create a new device not found error
    pub fn device_not_found<S: Into<String>>(name: S) -> Self {
        Self::DeviceNotFound { name: name.into() }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new metadata error
    pub fn metadata<S: Into<String>>(message: S) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    /// Create an I/O error that names the path it failed on
    pub fn io_at(path: &Path, error: &std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), error),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

//! Core type system and error handling for mtpcopy
//!
//! This crate provides the foundational types shared by every mtpcopy crate:
//!
//! - **Error handling**: one error taxonomy with kinds and exit codes
//! - **Device model**: directory entries tagged as file or folder, virtual paths
//! - **Traits**: device providers, catalogs, metadata decoders, run observers
//! - **Configuration**: validated naming patterns and collision policies
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use mtpcopy_types::{DeviceFile, DeviceFolder, VirtualPath};
//!
//! let root = DeviceFolder::new("0", "")
//!     .with_child(DeviceFolder::new("1", "DCIM").with_child(DeviceFile::new("2", "a.jpg")));
//! let path = VirtualPath::parse("/DCIM/").unwrap();
//! assert_eq!(path.to_string(), "/DCIM");
//! assert_eq!(root.folders().count(), 1);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod path;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{CollisionPolicy, NamingPattern};
pub use error::{Error, ErrorKind};
pub use path::VirtualPath;
pub use result::Result;
pub use traits::*;
pub use types::*;

/// Application identifier used for hidden directory names
pub const APP_NAME: &str = "mtpcopy";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_observer_accepts_events() {
        let observer = NoopObserver;
        observer.on_run_started(uuid::Uuid::new_v4(), 2);
        observer.on_file_started(&DeviceFile::new("1", "a.jpg"));
        observer.on_file_finished(&FileReport {
            name: "a.jpg".to_string(),
            outcome: FileOutcome::Skipped,
        });
    }

    #[test]
    fn test_error_display() {
        let error = Error::directory_not_found("/DCIM/Missing");
        assert_eq!(
            error.to_string(),
            "Directory not found on device: /DCIM/Missing"
        );
    }
}

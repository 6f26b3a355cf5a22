//! Idempotent transfer engine for mtpcopy
//!
//! This crate copies the files of one device directory into a local
//! destination root, at most once per file name, surviving interruption and
//! re-runs.
//!
//! # Layout on disk
//!
//! ```text
//! <destination>/
//!   .mtpcopy-temp/<run-id>/...    staging, present during or after a failed run
//!   .mtpcopy-flags/<file-name>    one marker per transferred file
//!   <transferred files>
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use mtpcopy_device::MountedDevice;
//! use mtpcopy_engine::{TransferEngine, TransferRequest};
//!
//! # async fn example() -> mtpcopy_types::Result<()> {
//! let device = MountedDevice::new("/run/user/1000/gvfs/mtp:host=Pixel");
//! let request = TransferRequest::new("/Internal shared storage/DCIM/Camera", "/home/me/Pictures");
//! let report = TransferEngine::new().run(&device, &request).await?;
//! println!("Transferred {} files", report.stats.files_transferred);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod flags;
mod hidden;
pub mod naming;
pub mod placement;
pub mod resolver;
pub mod session;
pub mod staging;

pub use engine::{TransferEngine, TransferRequest};
pub use flags::CompletionTracker;
pub use naming::{ensure_safe_name, ExifDecoder, NamingResolver};
pub use resolver::{resolve, resolve_str};
pub use session::DeviceSession;
pub use staging::StagingArea;

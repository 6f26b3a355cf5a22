//! Device directory providers for mtpcopy
//!
//! This crate implements the [`DeviceProvider`] and [`DeviceCatalog`] seams
//! from `mtpcopy-types`:
//!
//! - **In-memory device**: a scripted tree with failure injection and session
//!   counters, used by tests and demos
//! - **Mounted device**: a device exposed through a local mount point such as
//!   a gvfs MTP mount, a jmtpfs mount, or a camera card
//! - **Mount catalog**: enumerates the devices under a mount root
//!
//! # Examples
//!
//! ```rust
//! use mtpcopy_device::InMemoryDevice;
//! use mtpcopy_types::DeviceProvider;
//!
//! # tokio_test::block_on(async {
//! let device = InMemoryDevice::new("Pixel")
//!     .with_file("/DCIM/Camera", "IMG_0001.jpg", b"jpeg".to_vec());
//! device.connect().await?;
//! let root = device.root_directory().await?;
//! assert_eq!(root.folders().count(), 1);
//! device.disconnect().await?;
//! # Ok::<(), mtpcopy_types::Error>(())
//! # });
//! ```
//!
//! [`DeviceProvider`]: mtpcopy_types::DeviceProvider
//! [`DeviceCatalog`]: mtpcopy_types::DeviceCatalog

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod inmemory;
pub mod mounted;
mod tree;

pub use catalog::MountCatalog;
pub use inmemory::InMemoryDevice;
pub use mounted::MountedDevice;

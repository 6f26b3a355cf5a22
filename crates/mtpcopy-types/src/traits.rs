//! Core traits for mtpcopy
//!
//! This module defines the seams between the transfer engine and its
//! collaborators: the device that exposes a directory tree, the catalog that
//! finds devices, the decoder that reads capture times, and the observer that
//! follows a run.

use crate::{DeviceDescriptor, DeviceFile, DeviceFolder, FileReport, Result, RunId};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDateTime;

/// A device exposing a hierarchical directory tree
///
/// Calls are bracketed by `connect` and `disconnect`. The tree returned by
/// `root_directory` is only valid while connected.
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// Name the device is known by
    fn name(&self) -> &str;

    /// Open a session with the device
    async fn connect(&self) -> Result<()>;

    /// Close the session
    async fn disconnect(&self) -> Result<()>;

    /// Read the full directory tree from the device root
    async fn root_directory(&self) -> Result<DeviceFolder>;

    /// Fetch the whole content of a file
    async fn download_file(&self, file: &DeviceFile) -> Result<Bytes>;
}

/// Enumerates devices and opens them by name
#[async_trait]
pub trait DeviceCatalog: Send + Sync {
    /// List the devices currently available
    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Open a device by name, failing with `DeviceNotFound` if it is absent
    async fn open(&self, name: &str) -> Result<Box<dyn DeviceProvider>>;
}

/// Extracts a capture timestamp from file content
pub trait MetadataDecoder: Send + Sync {
    /// Return the capture time embedded in `payload`, if any
    ///
    /// `Ok(None)` means the payload carries no usable timestamp. Errors mean
    /// the payload could not be parsed at all.
    fn capture_timestamp(&self, payload: &[u8]) -> Result<Option<NaiveDateTime>>;
}

/// Receives per-file progress events from a transfer run
#[allow(unused_variables)]
pub trait TransferObserver: Send + Sync {
    /// The source directory was resolved and `total_files` files will be visited
    fn on_run_started(&self, run_id: RunId, total_files: usize) {}

    /// Processing of a file begins
    fn on_file_started(&self, file: &DeviceFile) {}

    /// A file reached a terminal state
    fn on_file_finished(&self, report: &FileReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransferObserver for NoopObserver {}

//! Core data types for mtpcopy
//!
//! This module provides the device entry model read by the engine and the
//! structured report a transfer run produces.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Unique identifier for a transfer run
pub type RunId = uuid::Uuid;

/// Provider-assigned identifier of a device object
pub type EntryId = String;

/// A file object on the device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceFile {
    /// Provider object identifier
    pub id: EntryId,
    /// File name as reported by the device
    pub name: String,
    /// Size in bytes, if the device reports one
    pub size: Option<u64>,
}

impl DeviceFile {
    /// Create a new file entry
    pub fn new<I: Into<EntryId>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: None,
        }
    }

    /// Set the reported size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// A folder object on the device with its ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceFolder {
    /// Provider object identifier
    pub id: EntryId,
    /// Folder name as reported by the device
    pub name: String,
    /// Children in device listing order
    pub children: Vec<DeviceEntry>,
}

impl DeviceFolder {
    /// Create a new, empty folder
    pub fn new<I: Into<EntryId>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Append a child entry
    pub fn with_child<E: Into<DeviceEntry>>(mut self, child: E) -> Self {
        self.children.push(child.into());
        self
    }

    /// Child files in listing order
    pub fn files(&self) -> impl Iterator<Item = &DeviceFile> {
        self.children.iter().filter_map(|entry| match entry {
            DeviceEntry::File(file) => Some(file),
            DeviceEntry::Folder(_) => None,
        })
    }

    /// Child folders in listing order
    pub fn folders(&self) -> impl Iterator<Item = &DeviceFolder> {
        self.children.iter().filter_map(|entry| match entry {
            DeviceEntry::Folder(folder) => Some(folder),
            DeviceEntry::File(_) => None,
        })
    }
}

/// A single entry in a device directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceEntry {
    /// A file
    File(DeviceFile),
    /// A folder
    Folder(DeviceFolder),
}

impl DeviceEntry {
    /// Entry name
    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => &file.name,
            Self::Folder(folder) => &folder.name,
        }
    }

    /// Provider object identifier
    pub fn id(&self) -> &str {
        match self {
            Self::File(file) => &file.id,
            Self::Folder(folder) => &folder.id,
        }
    }

    /// Check if this entry is a folder
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

impl From<DeviceFile> for DeviceEntry {
    fn from(file: DeviceFile) -> Self {
        Self::File(file)
    }
}

impl From<DeviceFolder> for DeviceEntry {
    fn from(folder: DeviceFolder) -> Self {
        Self::Folder(folder)
    }
}

/// Describes a device a catalog can open
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceDescriptor {
    /// Name used to select the device
    pub name: String,
    /// Human readable description
    pub description: Option<String>,
    /// Where the device is reachable (mount point, bus address)
    pub location: Option<PathBuf>,
}

/// Terminal state of one source file within a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FileOutcome {
    /// A completion flag already existed
    Skipped,
    /// Downloaded, placed, and flagged
    Transferred {
        /// Final path relative to the destination root
        target: PathBuf,
        /// Bytes written
        bytes: u64,
    },
}

/// Per-file line of a transfer report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileReport {
    /// Source file name on the device
    pub name: String,
    /// What happened to it
    pub outcome: FileOutcome,
}

/// Transfer run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransferStats {
    /// Number of files transferred
    pub files_transferred: u64,
    /// Number of files skipped because they were already flagged
    pub files_skipped: u64,
    /// Total bytes written to the destination
    pub bytes_transferred: u64,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl TransferStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate the overall transfer rate in bytes per second
    pub fn transfer_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bytes_transferred as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Record a file outcome
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Skipped => self.files_skipped += 1,
            FileOutcome::Transferred { bytes, .. } => {
                self.files_transferred += 1;
                self.bytes_transferred += bytes;
            }
        }
    }
}

/// Structured result of a successful run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransferReport {
    /// Run identifier (also the staging directory name)
    pub run_id: RunId,
    /// Virtual source path, canonical form
    pub source: String,
    /// Destination root
    pub destination: PathBuf,
    /// Per-file outcomes in listing order
    pub files: Vec<FileReport>,
    /// Aggregate statistics
    pub stats: TransferStats,
}

impl TransferReport {
    /// Names of files transferred in this run
    pub fn transferred(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Transferred { .. }))
    }
}

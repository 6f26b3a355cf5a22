//! JSON output structures for the mtpcopy CLI

use mtpcopy_types::{Error, FileOutcome, TransferReport};
use serde::{Deserialize, Serialize};

/// Complete JSON output for a copy run
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResultJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Per-file outcomes; empty when the run failed
    pub files: Vec<FileJson>,
    /// Run statistics; absent when the run failed
    pub stats: Option<TransferStatsJson>,
    /// Overall result
    pub result: OperationResult,
}

/// Operation metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// mtpcopy version
    pub version: String,
    /// Timestamp when the output was produced
    pub timestamp: String,
    /// Device name
    pub device: String,
    /// Virtual source path
    pub source_path: String,
    /// Destination root
    pub destination_path: String,
    /// Run identifier, when the run got far enough to have one
    pub run_id: Option<String>,
}

/// Outcome of one file
#[derive(Debug, Serialize, Deserialize)]
pub struct FileJson {
    /// Source file name
    pub name: String,
    /// `transferred` or `skipped`
    pub status: String,
    /// Target path relative to the destination root
    pub target: Option<String>,
    /// Bytes written
    pub bytes: Option<u64>,
}

/// Run statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferStatsJson {
    /// Files transferred
    pub files_transferred: u64,
    /// Files skipped because they were already flagged
    pub files_skipped: u64,
    /// Bytes transferred
    pub bytes_transferred: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Transfer rate in MB/s
    pub transfer_rate_mbps: f64,
}

/// Overall run result
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the run succeeded
    pub success: bool,
    /// Error kind on failure
    pub error_kind: Option<String>,
    /// Human readable message
    pub message: String,
}

impl TransferResultJson {
    /// Build the output of a successful run
    pub fn from_report(device: &str, report: &TransferReport) -> Self {
        let files = report
            .files
            .iter()
            .map(|file| match &file.outcome {
                FileOutcome::Skipped => FileJson {
                    name: file.name.clone(),
                    status: "skipped".to_string(),
                    target: None,
                    bytes: None,
                },
                FileOutcome::Transferred { target, bytes } => FileJson {
                    name: file.name.clone(),
                    status: "transferred".to_string(),
                    target: Some(target.to_string_lossy().into_owned()),
                    bytes: Some(*bytes),
                },
            })
            .collect();

        let stats = &report.stats;
        Self {
            metadata: OperationMetadata::new(
                device,
                &report.source,
                &report.destination.to_string_lossy(),
                Some(report.run_id.to_string()),
            ),
            files,
            stats: Some(TransferStatsJson {
                files_transferred: stats.files_transferred,
                files_skipped: stats.files_skipped,
                bytes_transferred: stats.bytes_transferred,
                duration_ms: stats.duration.as_millis() as u64,
                transfer_rate_mbps: stats.transfer_rate() / 1024.0 / 1024.0,
            }),
            result: OperationResult {
                success: true,
                error_kind: None,
                message: format!(
                    "{} transferred, {} skipped",
                    stats.files_transferred, stats.files_skipped
                ),
            },
        }
    }

    /// Build the output of a failed run
    pub fn from_error(device: &str, source: &str, destination: &str, error: &Error) -> Self {
        Self {
            metadata: OperationMetadata::new(device, source, destination, None),
            files: Vec::new(),
            stats: None,
            result: OperationResult {
                success: false,
                error_kind: Some(format!("{:?}", error.kind())),
                message: error.to_string(),
            },
        }
    }
}

impl OperationMetadata {
    fn new(device: &str, source: &str, destination: &str, run_id: Option<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            device: device.to_string(),
            source_path: source.to_string(),
            destination_path: destination.to_string(),
            run_id,
        }
    }
}

//! Progress display for transfer runs

use indicatif::{ProgressBar, ProgressStyle};
use mtpcopy_types::{DeviceFile, FileOutcome, FileReport, RunId, TransferObserver};
use std::time::Duration;

/// Draws a progress bar while a run is active
pub struct ProgressObserver {
    progress_bar: ProgressBar,
}

impl ProgressObserver {
    /// Create a progress bar with a steady spinner
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Connecting...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { progress_bar: pb }
    }

    /// Finish the bar with a final message
    pub fn finish(&self, message: &str) {
        self.progress_bar.finish_with_message(message.to_string());
    }

    /// Remove the bar without a message
    pub fn abandon(&self) {
        self.progress_bar.abandon();
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferObserver for ProgressObserver {
    fn on_run_started(&self, _run_id: RunId, total_files: usize) {
        self.progress_bar.set_length(total_files as u64);
        self.progress_bar.set_message("Transferring");
    }

    fn on_file_started(&self, file: &DeviceFile) {
        self.progress_bar.set_message(file.name.clone());
    }

    fn on_file_finished(&self, report: &FileReport) {
        if let FileOutcome::Transferred { target, .. } = &report.outcome {
            self.progress_bar
                .println(format!("  {} -> {}", report.name, target.display()));
        }
        self.progress_bar.inc(1);
    }
}

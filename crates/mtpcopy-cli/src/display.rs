//! Display utilities for the mtpcopy CLI

use console::style;
use mtpcopy_types::{DeviceDescriptor, DeviceEntry, TransferReport};
use std::time::Duration;

/// Print the statistics of a finished run
pub fn print_transfer_stats(report: &TransferReport) {
    let stats = &report.stats;
    println!();
    println!("{}", style("Transfer Statistics:").bold().underlined());
    println!(
        "  Files transferred: {}",
        style(stats.files_transferred).green()
    );
    println!("  Files skipped: {}", style(stats.files_skipped).yellow());
    println!(
        "  Bytes transferred: {}",
        style(format_bytes(stats.bytes_transferred)).green()
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.duration)).blue()
    );
    println!(
        "  Transfer rate: {}",
        style(format!(
            "{:.2} MB/s",
            stats.transfer_rate() / 1024.0 / 1024.0
        ))
        .blue()
    );
}

/// Print the entries of a device directory, folders first
pub fn print_entries(path: &str, entries: &[DeviceEntry]) {
    println!("{}", style(path).bold());
    let folders = entries.iter().filter(|e| e.is_folder());
    let files = entries.iter().filter(|e| !e.is_folder());

    for entry in folders.chain(files) {
        match entry {
            DeviceEntry::Folder(folder) => {
                println!("  {}/", style(&folder.name).blue().bold());
            }
            DeviceEntry::File(file) => {
                let size = file.size.map(format_bytes).unwrap_or_default();
                println!("  {:<48} {:>12}", file.name, style(size).dim());
            }
        }
    }
}

/// Print available devices
pub fn print_devices(devices: &[DeviceDescriptor]) {
    if devices.is_empty() {
        println!("{} No devices found", style("ℹ").yellow());
        return;
    }
    for device in devices {
        match &device.location {
            Some(location) => println!(
                "  {}  {}",
                style(&device.name).cyan().bold(),
                style(location.display()).dim()
            ),
            None => println!("  {}", style(&device.name).cyan().bold()),
        }
    }
}

/// Format a byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format a duration for humans
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

//! mtpcopy test fixtures
//!
//! Devices and payloads shared by the integration tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

use bytes::Bytes;
use mtpcopy_device::InMemoryDevice;
use mtpcopy_types::{DeviceFile, DeviceFolder};
use tempfile::TempDir;

/// Capture time written by [`jpeg_with_capture_time`] when none is given
pub const SAMPLE_CAPTURE_TIME: &str = "2021:03:04 15:06:07";

/// Build a minimal JPEG whose EXIF block carries `DateTimeOriginal`
///
/// The layout is SOI, one APP1 segment holding a little-endian TIFF
/// structure (IFD0 pointing at an Exif IFD with a single ASCII field), then
/// EOI. `capture_time` must be exactly 19 characters in
/// `YYYY:MM:DD HH:MM:SS` form.
pub fn jpeg_with_capture_time(capture_time: &str) -> Vec<u8> {
    assert_eq!(capture_time.len(), 19, "EXIF date/time is 19 characters");

    let mut tiff = Vec::new();
    // Header: byte order, magic, offset of IFD0
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());

    // IFD0 at 8: one entry, ExifIFDPointer -> 26
    tiff.extend_from_slice(&1u16.to_le_bytes());
    push_entry(&mut tiff, 0x8769, 4, 1, 26);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    // Exif IFD at 26: one entry, DateTimeOriginal -> 44
    tiff.extend_from_slice(&1u16.to_le_bytes());
    push_entry(&mut tiff, 0x9003, 2, 20, 44);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    // ASCII value at 44, NUL terminated
    tiff.extend_from_slice(capture_time.as_bytes());
    tiff.push(0);

    let mut jpeg = vec![0xFF, 0xD8];
    let segment_len = u16::try_from(2 + 6 + tiff.len()).expect("APP1 segment fits");
    jpeg.extend_from_slice(&[0xFF, 0xE1]);
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

fn push_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value.to_le_bytes());
}

/// A JPEG with a JFIF header and no EXIF block
pub fn jpeg_without_metadata() -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    // APP0 JFIF 1.01, no thumbnail
    jpeg.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    jpeg.extend_from_slice(b"JFIF\0");
    jpeg.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// A phone-like device
///
/// `/Internal storage/DCIM/Camera` holds one JPEG with a capture time, one
/// JPEG without metadata, and a video. `/Internal storage/Download` holds a
/// text file.
pub fn sample_device() -> InMemoryDevice {
    InMemoryDevice::new("Pixel")
        .with_file(
            "/Internal storage/DCIM/Camera",
            "IMG_0001.jpg",
            jpeg_with_capture_time(SAMPLE_CAPTURE_TIME),
        )
        .with_file(
            "/Internal storage/DCIM/Camera",
            "IMG_0002.JPG",
            jpeg_without_metadata(),
        )
        .with_file(
            "/Internal storage/DCIM/Camera",
            "VID_0003.mp4",
            Bytes::from_static(b"not really a movie"),
        )
        .with_folder("/Internal storage/DCIM/Camera/.thumbnails")
        .with_file(
            "/Internal storage/Download",
            "notes.txt",
            Bytes::from_static(b"shopping list"),
        )
}

/// A device whose root holds two folders both named `A`
pub fn ambiguous_device() -> InMemoryDevice {
    let root = DeviceFolder::new("0", "")
        .with_child(DeviceFolder::new("1", "A").with_child(DeviceFile::new("f1", "one.txt")))
        .with_child(DeviceFolder::new("2", "A").with_child(DeviceFile::new("f2", "two.txt")));
    InMemoryDevice::from_tree("twins", root)
        .with_content("f1", Bytes::from_static(b"1"))
        .with_content("f2", Bytes::from_static(b"2"))
}

/// A fresh, existing destination root
pub fn destination() -> TempDir {
    TempDir::new().expect("create destination directory")
}

/// Relative paths of every regular file under `root`, hidden folders excluded, sorted
pub fn visible_files(root: &std::path::Path) -> Vec<String> {
    fn walk(dir: &std::path::Path, prefix: &str, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };
            if entry.path().is_dir() {
                walk(&entry.path(), &relative, out);
            } else {
                out.push(relative);
            }
        }
    }

    let mut out = Vec::new();
    walk(root, "", &mut out);
    out.sort();
    out
}

//! Target naming
//!
//! JPEG files are named after their capture time when the payload carries
//! one. Every other file keeps its device name.

use crate::flags::flags_dir_name;
use crate::staging::staging_root_name;
use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};
use mtpcopy_types::{Error, MetadataDecoder, NamingPattern, Result};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extensions whose payload is inspected for a capture time
const JPEG_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Reject names that could escape the directory they are joined to
///
/// Empty names, `.`, `..`, names containing a separator or NUL, and the
/// names of the flags and staging directories fail with `UnsafeName`.
/// Reserved names are matched ignoring ASCII case.
pub fn ensure_safe_name(name: &str) -> Result<()> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.contains(std::path::MAIN_SEPARATOR)
        || is_reserved_name(name);
    if unsafe_name {
        return Err(Error::UnsafeName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn is_reserved_name(name: &str) -> bool {
    [flags_dir_name(), staging_root_name()]
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Reads capture times from EXIF data
///
/// `DateTimeOriginal` is preferred, then `DateTimeDigitized`. The matching
/// sub-second tag fills in the fraction when present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifDecoder;

impl ExifDecoder {
    fn read_tag(exif: &exif::Exif, tag: Tag, subsec: Tag) -> Option<NaiveDateTime> {
        let field = exif.get_field(tag, In::PRIMARY)?;
        let Value::Ascii(ref values) = field.value else {
            return None;
        };
        let mut stamp = match exif::DateTime::from_ascii(values.first()?) {
            Ok(stamp) => stamp,
            Err(e) => {
                debug!("Ignoring malformed {}: {}", tag, e);
                return None;
            }
        };

        if let Some(field) = exif.get_field(subsec, In::PRIMARY) {
            if let Value::Ascii(ref values) = field.value {
                if let Some(raw) = values.first() {
                    let _ = stamp.parse_subsec(raw);
                }
            }
        }

        NaiveDate::from_ymd_opt(
            i32::from(stamp.year),
            u32::from(stamp.month),
            u32::from(stamp.day),
        )?
        .and_hms_nano_opt(
            u32::from(stamp.hour),
            u32::from(stamp.minute),
            u32::from(stamp.second),
            stamp.nanosecond.unwrap_or(0),
        )
    }
}

impl MetadataDecoder for ExifDecoder {
    fn capture_timestamp(&self, payload: &[u8]) -> Result<Option<NaiveDateTime>> {
        let mut cursor = Cursor::new(payload);
        let exif = match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(Error::metadata(e.to_string())),
        };

        Ok(
            Self::read_tag(&exif, Tag::DateTimeOriginal, Tag::SubSecTimeOriginal).or_else(|| {
                Self::read_tag(&exif, Tag::DateTimeDigitized, Tag::SubSecTimeDigitized)
            }),
        )
    }
}

/// Decides the path, relative to the destination root, a file is placed at
#[derive(Clone)]
pub struct NamingResolver {
    pattern: NamingPattern,
    decoder: Arc<dyn MetadataDecoder>,
    rename_by_capture_time: bool,
}

impl std::fmt::Debug for NamingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamingResolver")
            .field("pattern", &self.pattern)
            .field("rename_by_capture_time", &self.rename_by_capture_time)
            .finish_non_exhaustive()
    }
}

impl NamingResolver {
    /// Create a resolver using `pattern` and `decoder`
    pub fn new(pattern: NamingPattern, decoder: Arc<dyn MetadataDecoder>) -> Self {
        Self {
            pattern,
            decoder,
            rename_by_capture_time: true,
        }
    }

    /// Enable or disable capture-time renaming
    pub fn rename_by_capture_time(mut self, enabled: bool) -> Self {
        self.rename_by_capture_time = enabled;
        self
    }

    /// Resolve the relative target path for a file
    ///
    /// Decoding failures are logged and fall back to the original name, so
    /// this never fails.
    pub fn resolve_name(&self, original_name: &str, payload: &[u8]) -> PathBuf {
        if !self.rename_by_capture_time {
            return PathBuf::from(original_name);
        }

        let Some(extension) = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
        else {
            return PathBuf::from(original_name);
        };
        if !JPEG_EXTENSIONS
            .iter()
            .any(|jpeg| extension.eq_ignore_ascii_case(jpeg))
        {
            return PathBuf::from(original_name);
        }

        match self.decoder.capture_timestamp(payload) {
            Ok(Some(captured)) => {
                let formatted = format!("{}.{}", self.pattern.format(&captured), extension);
                let relative: PathBuf = formatted
                    .split(mtpcopy_types::path::is_separator)
                    .collect();
                debug!(
                    "{} was captured {}, naming it {}",
                    original_name,
                    captured,
                    relative.display()
                );
                relative
            }
            Ok(None) => {
                debug!("{} carries no capture time", original_name);
                PathBuf::from(original_name)
            }
            Err(e) => {
                warn!(
                    "Could not read metadata of {}, keeping its name: {}",
                    original_name, e
                );
                PathBuf::from(original_name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct FixedDecoder(Result<Option<NaiveDateTime>>);

    impl MetadataDecoder for FixedDecoder {
        fn capture_timestamp(&self, _payload: &[u8]) -> Result<Option<NaiveDateTime>> {
            match &self.0 {
                Ok(value) => Ok(*value),
                Err(e) => Err(Error::metadata(e.to_string())),
            }
        }
    }

    fn captured() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(15, 6, 7)
            .unwrap()
    }

    fn resolver(outcome: Result<Option<NaiveDateTime>>) -> NamingResolver {
        NamingResolver::new(NamingPattern::default(), Arc::new(FixedDecoder(outcome)))
    }

    #[rstest]
    #[case("IMG_0001.jpg", "2021/03/2021-03-04_15-06-07.jpg")]
    #[case("IMG_0001.JPG", "2021/03/2021-03-04_15-06-07.JPG")]
    #[case("IMG_0001.jpeg", "2021/03/2021-03-04_15-06-07.jpeg")]
    #[case("VID_0001.mp4", "VID_0001.mp4")]
    #[case("README", "README")]
    fn test_resolve_with_timestamp(#[case] name: &str, #[case] expected: &str) {
        let resolver = resolver(Ok(Some(captured())));
        let expected: PathBuf = expected.split('/').collect();
        assert_eq!(resolver.resolve_name(name, b""), expected);
    }

    #[test]
    fn test_missing_timestamp_keeps_name() {
        let resolver = resolver(Ok(None));
        assert_eq!(resolver.resolve_name("a.jpg", b""), PathBuf::from("a.jpg"));
    }

    #[test]
    fn test_decode_error_keeps_name() {
        let resolver = resolver(Err(Error::metadata("corrupt")));
        assert_eq!(resolver.resolve_name("a.jpg", b""), PathBuf::from("a.jpg"));
    }

    #[test]
    fn test_renaming_disabled() {
        let resolver = resolver(Ok(Some(captured()))).rename_by_capture_time(false);
        assert_eq!(resolver.resolve_name("a.jpg", b""), PathBuf::from("a.jpg"));
    }

    #[test]
    fn test_exif_decoder_without_exif() {
        // Bare SOI + EOI: a JPEG with no APP1 segment
        let payload = [0xFF, 0xD8, 0xFF, 0xD9];
        assert_eq!(ExifDecoder.capture_timestamp(&payload).unwrap(), None);
    }

    #[test]
    fn test_exif_decoder_rejects_garbage() {
        let resolver = NamingResolver::new(NamingPattern::default(), Arc::new(ExifDecoder));
        assert!(ExifDecoder.capture_timestamp(b"not an image").is_err());
        assert_eq!(
            resolver.resolve_name("broken.jpg", b"not an image"),
            PathBuf::from("broken.jpg")
        );
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../a.jpg")]
    #[case("a/b.jpg")]
    #[case("a\\b.jpg")]
    #[case("a\0.jpg")]
    #[case(".mtpcopy-flags")]
    #[case(".mtpcopy-temp")]
    #[case(".MTPCOPY-Flags")]
    fn test_unsafe_names(#[case] name: &str) {
        assert!(ensure_safe_name(name).is_err());
    }

    #[rstest]
    #[case("IMG_0001.jpg")]
    #[case(".hidden")]
    #[case("a..b")]
    #[case(".mtpcopy-flags.jpg")]
    fn test_safe_names(#[case] name: &str) {
        assert!(ensure_safe_name(name).is_ok());
    }
}

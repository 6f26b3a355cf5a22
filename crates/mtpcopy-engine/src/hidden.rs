//! Hidden attribute for the staging and flag directories
//!
//! On Unix the leading dot in `.mtpcopy-temp` and `.mtpcopy-flags` already
//! hides them. On Windows the hidden file attribute is set as well.

use mtpcopy_types::Result;
use std::path::Path;

/// Mark a directory hidden
#[cfg(windows)]
pub(crate) fn mark_hidden(path: &Path) -> Result<()> {
    use mtpcopy_types::Error;
    use windows::core::HSTRING;
    use windows::Win32::Storage::FileSystem::{
        GetFileAttributesW, SetFileAttributesW, FILE_ATTRIBUTE_HIDDEN, FILE_FLAGS_AND_ATTRIBUTES,
        INVALID_FILE_ATTRIBUTES,
    };

    let wide = HSTRING::from(path.as_os_str());
    // SAFETY: `wide` is a valid, NUL-terminated wide string for the call
    let current = unsafe { GetFileAttributesW(&wide) };
    if current == INVALID_FILE_ATTRIBUTES {
        return Err(Error::io_at(path, &std::io::Error::last_os_error()));
    }

    // SAFETY: as above
    unsafe {
        SetFileAttributesW(
            &wide,
            FILE_FLAGS_AND_ATTRIBUTES(current | FILE_ATTRIBUTE_HIDDEN.0),
        )
    }
    .map_err(|e| Error::io_at(path, &std::io::Error::other(e.to_string())))
}

/// Mark a directory hidden
#[cfg(not(windows))]
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn mark_hidden(path: &Path) -> Result<()> {
    tracing::trace!("{} is hidden by its dot prefix", path.display());
    Ok(())
}

//! Completion flags
//!
//! A flag file `<root>/.mtpcopy-flags/<name>` records that the source file
//! `name` was transferred. Its content is the completion time in RFC 3339
//! form and is never read back; only its existence matters. Flags are keyed
//! by name alone, so moving or deleting the transferred file does not cause
//! it to be copied again.
//!
//! There is no locking. One run at a time per destination root is assumed.

use crate::hidden::mark_hidden;
use crate::naming::ensure_safe_name;
use mtpcopy_types::{Error, Result, APP_NAME};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the flags directory
pub fn flags_dir_name() -> String {
    format!(".{}-flags", APP_NAME)
}

/// Tracks which source file names have been transferred to a destination
#[derive(Debug, Clone)]
pub struct CompletionTracker {
    dir: PathBuf,
}

impl CompletionTracker {
    /// Create a tracker for `destination_root`
    pub fn new(destination_root: &Path) -> Self {
        Self {
            dir: destination_root.join(flags_dir_name()),
        }
    }

    /// Path of the flags directory
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Flag file path for a source file name
    pub fn flag_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Check whether `name` has been transferred
    pub async fn is_done(&self, name: &str) -> Result<bool> {
        let path = self.flag_path(name);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| Error::io_at(&path, &e))
    }

    /// Record that `name` has been transferred
    pub async fn mark_done(&self, name: &str) -> Result<()> {
        let existed = tokio::fs::try_exists(&self.dir)
            .await
            .map_err(|e| Error::io_at(&self.dir, &e))?;
        if !existed {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| Error::io_at(&self.dir, &e))?;
            mark_hidden(&self.dir)?;
        }

        let path = self.flag_path(name);
        let stamp = chrono::Utc::now().to_rfc3339();
        tokio::fs::write(&path, stamp.as_bytes())
            .await
            .map_err(|e| Error::io_at(&path, &e))?;
        debug!("Flagged {}", name);
        Ok(())
    }

    /// Names of all flagged files, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io_at(&self.dir, &e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_at(&self.dir, &e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Delete the flag for `name` so the file is transferred again
    ///
    /// Returns `false` if there was no flag.
    pub async fn forget(&self, name: &str) -> Result<bool> {
        ensure_safe_name(name)?;
        let path = self.flag_path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Forgot flag {}", name);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io_at(&path, &e)),
        }
    }
}

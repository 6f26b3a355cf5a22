//! Per-run staging directory
//!
//! Files are downloaded into `<root>/.mtpcopy-temp/<run-id>/` and only moved
//! to their final location once complete. The directory is created on first
//! use and removed when the run finishes. An aborted run leaves it in place.

use crate::hidden::mark_hidden;
use mtpcopy_types::{Error, Result, RunId, APP_NAME};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tracing::debug;

/// Name of the directory holding all staging directories
pub fn staging_root_name() -> String {
    format!(".{}-temp", APP_NAME)
}

/// Staging directory of one transfer run
#[derive(Debug)]
pub struct StagingArea {
    parent: PathBuf,
    dir: PathBuf,
    run_id: RunId,
    created: bool,
}

impl StagingArea {
    /// Describe the staging directory for `run_id` under `destination_root`
    ///
    /// Nothing is created on disk until the first file is staged.
    pub fn new(destination_root: &Path, run_id: RunId) -> Self {
        let parent = destination_root.join(staging_root_name());
        let dir = parent.join(run_id.to_string());
        Self {
            parent,
            dir,
            run_id,
            created: false,
        }
    }

    /// Path of the staging directory
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Run this directory belongs to
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Check whether the directory has been created
    pub fn is_created(&self) -> bool {
        self.created
    }

    async fn ensure_created(&mut self) -> Result<()> {
        if self.created {
            return Ok(());
        }
        let parent_existed = tokio::fs::try_exists(&self.parent)
            .await
            .map_err(|e| Error::io_at(&self.parent, &e))?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io_at(&self.dir, &e))?;
        if !parent_existed {
            mark_hidden(&self.parent)?;
        }
        mark_hidden(&self.dir)?;
        self.created = true;
        debug!("Created staging directory {}", self.dir.display());
        Ok(())
    }

    /// Create a new, empty staged file named `name`
    ///
    /// Fails with `StagingCollision` if the file already exists in this run.
    pub async fn create_file(&mut self, name: &str) -> Result<(File, PathBuf)> {
        self.ensure_created().await?;
        let path = self.dir.join(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => Error::StagingCollision { path: path.clone() },
                _ => Error::io_at(&path, &e),
            })?;
        Ok((file, path))
    }

    /// Remove the staging directory after a successful run
    ///
    /// The directory must be empty. A failure here means a staged file leaked
    /// and is returned to the caller. The shared parent is removed too when
    /// no other run left anything in it.
    pub async fn finish(self) -> Result<()> {
        if !self.created {
            return Ok(());
        }
        tokio::fs::remove_dir(&self.dir)
            .await
            .map_err(|e| Error::io_at(&self.dir, &e))?;
        debug!("Removed staging directory {}", self.dir.display());

        if let Err(e) = tokio::fs::remove_dir(&self.parent).await {
            debug!(
                "Keeping {} ({}): other staging directories remain",
                self.parent.display(),
                e
            );
        }
        Ok(())
    }
}

//! Moving staged files to their final location

use mtpcopy_types::{CollisionPolicy, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

async fn exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| Error::io_at(path, &e))
}

/// First free `stem (N).ext` next to `path`
async fn find_unique_name(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|s| s.to_string_lossy().into_owned());

    let mut counter = 1u32;
    loop {
        let candidate = match &extension {
            Some(ext) => parent.join(format!("{} ({}).{}", stem, counter, ext)),
            None => parent.join(format!("{} ({})", stem, counter)),
        };
        if !exists(&candidate).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Move `staged` to `root/relative`, applying `policy` if the target exists
///
/// Missing parent directories are created. Returns the final path relative
/// to `root`.
pub async fn place(
    staged: &Path,
    root: &Path,
    relative: &Path,
    policy: CollisionPolicy,
) -> Result<PathBuf> {
    let mut target = root.join(relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_at(parent, &e))?;
    }

    if exists(&target).await? {
        match policy {
            CollisionPolicy::Overwrite => {
                info!("Replacing existing {}", target.display());
            }
            CollisionPolicy::Fail => {
                return Err(Error::DestinationExists { path: target });
            }
            CollisionPolicy::Rename => {
                let renamed = find_unique_name(&target).await?;
                info!(
                    "{} exists, placing as {}",
                    target.display(),
                    renamed.display()
                );
                target = renamed;
            }
        }
    }

    tokio::fs::rename(staged, &target)
        .await
        .map_err(|e| Error::io_at(&target, &e))?;
    debug!("Placed {} at {}", staged.display(), target.display());

    Ok(target
        .strip_prefix(root)
        .map_or_else(|_| target.clone(), Path::to_path_buf))
}

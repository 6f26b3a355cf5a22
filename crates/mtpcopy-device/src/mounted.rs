//! Devices exposed through a local mount point
//!
//! Desktop MTP stacks (gvfs, jmtpfs, kio) and card readers present a device
//! as an ordinary directory. [`MountedDevice`] reads that directory as a
//! device tree. Entry ids are paths relative to the mount point.

use crate::tree::insert_at;
use async_trait::async_trait;
use bytes::Bytes;
use mtpcopy_types::{DeviceFile, DeviceFolder, DeviceProvider, Error, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A device rooted at a mount point
#[derive(Debug)]
pub struct MountedDevice {
    name: String,
    mount_point: PathBuf,
    connected: AtomicBool,
}

impl MountedDevice {
    /// Create a device for a mount point, named after its last component
    pub fn new<P: Into<PathBuf>>(mount_point: P) -> Self {
        let mount_point = mount_point.into();
        let name = mount_point
            .file_name()
            .map_or_else(|| mount_point.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::with_name(name, mount_point)
    }

    /// Create a device with an explicit name
    pub fn with_name<S: Into<String>, P: Into<PathBuf>>(name: S, mount_point: P) -> Self {
        Self {
            name: name.into(),
            mount_point: mount_point.into(),
            connected: AtomicBool::new(false),
        }
    }

    /// The mount point this device reads from
    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::transport(format!("device '{}' is not connected", self.name)))
        }
    }

    /// Resolve an entry id to a path below the mount point
    fn object_path(&self, id: &str) -> Result<PathBuf> {
        let relative = Path::new(id);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::transport(format!("invalid object id '{}'", id)));
        }
        Ok(self.mount_point.join(relative))
    }
}

/// Build the device tree of a directory, children sorted by name
fn scan_tree(mount_point: &Path) -> Result<DeviceFolder> {
    let mut root = DeviceFolder::new("", "");

    for entry in WalkDir::new(mount_point)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::transport(format!("failed to read device: {}", e)))?;
        let Ok(relative) = entry.path().strip_prefix(mount_point) else {
            continue;
        };
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let mut make_id = |path: &[String]| path.join("/");

        if entry.file_type().is_dir() {
            insert_at(&mut root, &segments, 0, None, &mut make_id);
        } else if entry.file_type().is_file() {
            let Some((name, parents)) = segments.split_last() else {
                continue;
            };
            let size = entry.metadata().ok().map(|m| m.len());
            let mut file = DeviceFile::new(segments.join("/"), name.clone());
            file.size = size;
            insert_at(&mut root, parents, 0, Some(file.into()), &mut make_id);
        }
    }

    Ok(root)
}

#[async_trait]
impl DeviceProvider for MountedDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<()> {
        let is_dir = tokio::fs::metadata(&self.mount_point)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(Error::device_not_found(format!(
                "{} ({})",
                self.name,
                self.mount_point.display()
            )));
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(
            "Connected to device '{}' at {}",
            self.name,
            self.mount_point.display()
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        debug!("Disconnected from device '{}'", self.name);
        Ok(())
    }

    async fn root_directory(&self) -> Result<DeviceFolder> {
        self.ensure_connected()?;
        let mount_point = self.mount_point.clone();
        tokio::task::spawn_blocking(move || scan_tree(&mount_point))
            .await
            .map_err(|e| Error::other(format!("device scan task failed: {}", e)))?
    }

    async fn download_file(&self, file: &DeviceFile) -> Result<Bytes> {
        self.ensure_connected()?;
        let path = self.object_path(&file.id)?;
        let content = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::transport(format!("{}: {}", path.display(), e)))?;
        debug!("Downloaded {} ({} bytes)", file.id, content.len());
        Ok(Bytes::from(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtpcopy_types::ErrorKind;
    use rstest::rstest;
    use tempfile::TempDir;

    fn populated() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("DCIM/Camera")).unwrap();
        std::fs::create_dir_all(dir.path().join("Download")).unwrap();
        std::fs::write(dir.path().join("DCIM/Camera/b.jpg"), b"bbbb").unwrap();
        std::fs::write(dir.path().join("DCIM/Camera/a.jpg"), b"aa").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_scan_is_sorted_and_nested() {
        let dir = populated();
        let device = MountedDevice::new(dir.path());
        device.connect().await.unwrap();

        let root = device.root_directory().await.unwrap();
        let folders: Vec<_> = root.folders().map(|f| f.name.as_str()).collect();
        assert_eq!(folders, vec!["DCIM", "Download"]);

        let camera = root.folders().next().unwrap().folders().next().unwrap();
        assert_eq!(camera.id, "DCIM/Camera");
        let files: Vec<_> = camera.files().map(|f| (f.name.as_str(), f.size)).collect();
        assert_eq!(files, vec![("a.jpg", Some(2)), ("b.jpg", Some(4))]);

        let bytes = device.download_file(camera.files().nth(1).unwrap()).await.unwrap();
        assert_eq!(&bytes[..], b"bbbb");
    }

    #[tokio::test]
    async fn test_missing_mount_is_device_not_found() {
        let dir = TempDir::new().unwrap();
        let device = MountedDevice::new(dir.path().join("gone"));
        let error = device.connect().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DeviceNotFound);
    }

    #[rstest]
    #[case("../Download/x")]
    #[case("Camera/../../Download/x")]
    #[case("/etc/passwd")]
    #[tokio::test]
    async fn test_download_rejects_escaping_ids(#[case] id: &str) {
        let dir = populated();
        std::fs::write(dir.path().join("Download/x"), b"outside").unwrap();
        let device = MountedDevice::new(dir.path().join("DCIM"));
        device.connect().await.unwrap();

        let error = device.download_file(&DeviceFile::new(id, "x")).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Transport);
    }
}

//! Device enumeration over a mount root

use crate::MountedDevice;
use async_trait::async_trait;
use mtpcopy_types::{DeviceCatalog, DeviceDescriptor, DeviceProvider, Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Treats every sub-directory of a mount root as one device
///
/// With gvfs this is `$XDG_RUNTIME_DIR/gvfs`, where each connected phone
/// appears as a `mtp:host=...` directory.
#[derive(Debug, Clone)]
pub struct MountCatalog {
    root: PathBuf,
}

impl MountCatalog {
    /// Create a catalog for a mount root
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// The mount root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DeviceCatalog for MountCatalog {
    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        let mut devices = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Mount root {} does not exist", self.root.display());
                return Ok(devices);
            }
            Err(e) => return Err(Error::io_at(&self.root, &e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_at(&self.root, &e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            devices.push(DeviceDescriptor {
                name: entry.file_name().to_string_lossy().into_owned(),
                description: None,
                location: Some(entry.path()),
            });
        }

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(devices)
    }

    async fn open(&self, name: &str) -> Result<Box<dyn DeviceProvider>> {
        let devices = self.list_devices().await?;
        let descriptor = devices
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::device_not_found(name))?;
        let location = descriptor
            .location
            .ok_or_else(|| Error::device_not_found(name))?;
        Ok(Box::new(MountedDevice::with_name(descriptor.name, location)))
    }
}

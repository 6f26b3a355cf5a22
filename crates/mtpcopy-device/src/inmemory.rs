//! In-memory device for tests and demos
//!
//! The device tree is built up front with [`InMemoryDevice::with_file`] and
//! friends. Session calls and downloads are counted so callers can check that
//! a run connected and disconnected exactly once.

use crate::tree::{insert_at, split_segments};
use async_trait::async_trait;
use bytes::Bytes;
use mtpcopy_types::{DeviceEntry, DeviceFile, DeviceFolder, DeviceProvider, EntryId, Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// A scripted device held entirely in memory
#[derive(Debug)]
pub struct InMemoryDevice {
    name: String,
    root: DeviceFolder,
    contents: HashMap<EntryId, Bytes>,
    failing_downloads: HashSet<String>,
    connect_failure: Option<String>,
    disconnect_failure: Option<String>,
    next_id: u64,
    connected: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    downloads: AtomicUsize,
}

impl InMemoryDevice {
    /// Create an empty device
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            root: DeviceFolder::new("0", ""),
            contents: HashMap::new(),
            failing_downloads: HashSet::new(),
            connect_failure: None,
            disconnect_failure: None,
            next_id: 0,
            connected: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    /// Create a device from a prepared tree
    ///
    /// File content is attached afterwards with [`Self::with_content`].
    pub fn from_tree<S: Into<String>>(name: S, root: DeviceFolder) -> Self {
        Self {
            root,
            ..Self::new(name)
        }
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    /// Add a file under a `/`-separated folder path, creating folders as needed
    pub fn with_file<B: Into<Bytes>>(mut self, folder: &str, name: &str, content: B) -> Self {
        let content = content.into();
        let id = self.allocate_id();
        let file = DeviceFile::new(id.clone(), name).with_size(content.len() as u64);
        self.contents.insert(id, content);
        self.insert(folder, Some(file.into()));
        self
    }

    /// Add an empty folder at a `/`-separated path
    pub fn with_folder(mut self, path: &str) -> Self {
        self.insert(path, None);
        self
    }

    fn insert(&mut self, folder: &str, entry: Option<DeviceEntry>) {
        let segments = split_segments(folder);
        let mut root = std::mem::replace(&mut self.root, DeviceFolder::new("", ""));
        insert_at(&mut root, &segments, 0, entry, &mut |_| self.allocate_id());
        self.root = root;
    }

    /// Attach content to a file id of a prepared tree
    pub fn with_content<I: Into<EntryId>, B: Into<Bytes>>(mut self, id: I, content: B) -> Self {
        self.contents.insert(id.into(), content.into());
        self
    }

    /// Make downloads of files with this name fail with a transport error
    pub fn fail_download_of<S: Into<String>>(mut self, name: S) -> Self {
        self.failing_downloads.insert(name.into());
        self
    }

    /// Make `connect` fail
    pub fn fail_connect<S: Into<String>>(mut self, message: S) -> Self {
        self.connect_failure = Some(message.into());
        self
    }

    /// Make `disconnect` fail
    pub fn fail_disconnect<S: Into<String>>(mut self, message: S) -> Self {
        self.disconnect_failure = Some(message.into());
        self
    }

    /// Number of successful `connect` calls
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Number of completed downloads
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Check whether a session is open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::transport(format!("device '{}' is not connected", self.name)))
        }
    }
}

#[async_trait]
impl DeviceProvider for InMemoryDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<()> {
        if let Some(message) = &self.connect_failure {
            return Err(Error::transport(message.clone()));
        }
        self.connected.store(true, Ordering::SeqCst);
        self.connects.fetch_add(1, Ordering::SeqCst);
        debug!("Connected to in-memory device '{}'", self.name);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        debug!("Disconnected from in-memory device '{}'", self.name);
        match &self.disconnect_failure {
            Some(message) => Err(Error::transport(message.clone())),
            None => Ok(()),
        }
    }

    async fn root_directory(&self) -> Result<DeviceFolder> {
        self.ensure_connected()?;
        Ok(self.root.clone())
    }

    async fn download_file(&self, file: &DeviceFile) -> Result<Bytes> {
        self.ensure_connected()?;
        if self.failing_downloads.contains(&file.name) {
            return Err(Error::transport(format!(
                "injected download failure for '{}'",
                file.name
            )));
        }
        let content = self
            .contents
            .get(&file.id)
            .cloned()
            .ok_or_else(|| Error::transport(format!("no object with id '{}'", file.id)))?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(content)
    }
}

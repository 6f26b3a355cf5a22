//! Transfer orchestration

use crate::flags::CompletionTracker;
use crate::naming::{ensure_safe_name, ExifDecoder, NamingResolver};
use crate::placement::place;
use crate::resolver::resolve;
use crate::session::DeviceSession;
use crate::staging::StagingArea;
use mtpcopy_config::TransferConfig;
use mtpcopy_types::{
    CollisionPolicy, DeviceEntry, DeviceFile, DeviceProvider, Error, FileOutcome, FileReport,
    MetadataDecoder, NamingPattern, NoopObserver, Result, TransferObserver, TransferReport,
    TransferStats, VirtualPath,
};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Parameters of one transfer run
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Virtual path of the source directory on the device
    pub source: String,
    /// Local destination root; must already exist
    pub destination: PathBuf,
    /// Pattern for files named after their capture time
    pub naming_pattern: NamingPattern,
    /// What to do when a target path is taken
    pub collision_policy: CollisionPolicy,
    /// Rename JPEG files after their capture time
    pub rename_by_capture_time: bool,
}

impl TransferRequest {
    /// Create a new request with default settings
    pub fn new<S: Into<String>, P: Into<PathBuf>>(source: S, destination: P) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            naming_pattern: NamingPattern::default(),
            collision_policy: CollisionPolicy::default(),
            rename_by_capture_time: true,
        }
    }

    /// Create a request using the transfer settings of a configuration
    pub fn from_config<S: Into<String>, P: Into<PathBuf>>(
        source: S,
        destination: P,
        config: &TransferConfig,
    ) -> Self {
        Self::new(source, destination)
            .with_naming_pattern(config.naming_pattern.clone())
            .with_collision_policy(config.collision_policy)
            .rename_by_capture_time(config.rename_by_capture_time)
    }

    /// Set the naming pattern
    pub fn with_naming_pattern(mut self, pattern: NamingPattern) -> Self {
        self.naming_pattern = pattern;
        self
    }

    /// Set the collision policy
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Enable or disable capture-time renaming
    pub fn rename_by_capture_time(mut self, enabled: bool) -> Self {
        self.rename_by_capture_time = enabled;
        self
    }
}

/// Copies files from a device directory to a local root, once per file
///
/// Files are processed one at a time in listing order. For each file:
/// skip it if flagged, download it into the staging directory, pick its
/// name, move it into place, then flag it. The first error aborts the run
/// and leaves the staging directory behind. The device is disconnected on
/// every exit path once connected.
#[derive(Clone)]
pub struct TransferEngine {
    decoder: Arc<dyn MetadataDecoder>,
    observer: Arc<dyn TransferObserver>,
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine").finish_non_exhaustive()
    }
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferEngine {
    /// Create an engine reading EXIF capture times and reporting to nobody
    pub fn new() -> Self {
        Self {
            decoder: Arc::new(ExifDecoder),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Use a different metadata decoder
    pub fn with_decoder(mut self, decoder: Arc<dyn MetadataDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Report progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run a transfer
    ///
    /// The source path and destination root are checked before the device
    /// is contacted.
    pub async fn run(
        &self,
        provider: &dyn DeviceProvider,
        request: &TransferRequest,
    ) -> Result<TransferReport> {
        let started = Instant::now();
        let source = VirtualPath::parse(&request.source)?;
        ensure_target_root(&request.destination).await?;

        let session = DeviceSession::connect(provider).await?;
        let outcome = self
            .run_connected(session.provider(), &source, request)
            .await;
        let mut report = session.finish(outcome).await?;

        report.stats.duration = started.elapsed();
        info!(
            "Run {} finished: {} transferred, {} skipped, {} bytes",
            report.run_id,
            report.stats.files_transferred,
            report.stats.files_skipped,
            report.stats.bytes_transferred
        );
        Ok(report)
    }

    /// List the entries of a device directory
    pub async fn list(&self, provider: &dyn DeviceProvider, path: &str) -> Result<Vec<DeviceEntry>> {
        let path = VirtualPath::parse(path)?;
        let session = DeviceSession::connect(provider).await?;
        let outcome = async {
            let root = session.provider().root_directory().await?;
            Ok(resolve(&root, &path)?.children.clone())
        }
        .await;
        session.finish(outcome).await
    }

    async fn run_connected(
        &self,
        provider: &dyn DeviceProvider,
        source: &VirtualPath,
        request: &TransferRequest,
    ) -> Result<TransferReport> {
        let root = provider.root_directory().await?;
        let folder = resolve(&root, source)?;
        let files: Vec<&DeviceFile> = folder.files().collect();

        let run_id = Uuid::new_v4();
        info!(
            "Run {}: {} files from '{}' {} into {}",
            run_id,
            files.len(),
            provider.name(),
            source,
            request.destination.display()
        );
        self.observer.on_run_started(run_id, files.len());

        let naming = NamingResolver::new(request.naming_pattern.clone(), Arc::clone(&self.decoder))
            .rename_by_capture_time(request.rename_by_capture_time);
        let tracker = CompletionTracker::new(&request.destination);
        let mut staging = StagingArea::new(&request.destination, run_id);

        let mut report = TransferReport {
            run_id,
            source: source.to_string(),
            destination: request.destination.clone(),
            files: Vec::with_capacity(files.len()),
            stats: TransferStats::new(),
        };

        for file in files {
            self.observer.on_file_started(file);
            let outcome = match self
                .transfer_file(provider, file, &tracker, &mut staging, &naming, request)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        "Run {} aborted at '{}': {} (staging kept at {})",
                        run_id,
                        file.name,
                        e,
                        staging.path().display()
                    );
                    return Err(e);
                }
            };

            report.stats.record(&outcome);
            let file_report = FileReport {
                name: file.name.clone(),
                outcome,
            };
            self.observer.on_file_finished(&file_report);
            report.files.push(file_report);
        }

        staging.finish().await?;
        Ok(report)
    }

    async fn transfer_file(
        &self,
        provider: &dyn DeviceProvider,
        file: &DeviceFile,
        tracker: &CompletionTracker,
        staging: &mut StagingArea,
        naming: &NamingResolver,
        request: &TransferRequest,
    ) -> Result<FileOutcome> {
        ensure_safe_name(&file.name)?;

        if tracker.is_done(&file.name).await? {
            debug!("Skipping {}: already flagged", file.name);
            return Ok(FileOutcome::Skipped);
        }

        let (mut staged, staged_path) = staging.create_file(&file.name).await?;
        let payload = provider.download_file(file).await?;

        let io_error = |e: std::io::Error| Error::io_at(&staged_path, &e);
        staged.write_all(&payload).await.map_err(io_error)?;
        staged.flush().await.map_err(io_error)?;
        staged.sync_all().await.map_err(io_error)?;
        debug!("Staged {} ({} bytes)", file.name, payload.len());
        drop(payload);

        staged.seek(SeekFrom::Start(0)).await.map_err(io_error)?;
        let mut content = Vec::new();
        staged.read_to_end(&mut content).await.map_err(io_error)?;
        drop(staged);

        let relative = naming.resolve_name(&file.name, &content);
        let target = place(
            &staged_path,
            &request.destination,
            &relative,
            request.collision_policy,
        )
        .await?;

        tracker.mark_done(&file.name).await?;
        info!("Transferred {} -> {}", file.name, target.display());

        Ok(FileOutcome::Transferred {
            target,
            bytes: content.len() as u64,
        })
    }
}

async fn ensure_target_root(root: &Path) -> Result<()> {
    match tokio::fs::metadata(root).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        _ => Err(Error::TargetRootNotFound {
            path: root.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtpcopy_device::InMemoryDevice;
    use mtpcopy_types::ErrorKind;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn device() -> InMemoryDevice {
        InMemoryDevice::new("phone")
            .with_file("/DCIM/Camera", "a.mp4", b"movie".to_vec())
            .with_file("/DCIM/Camera", "b.txt", b"notes".to_vec())
            .with_folder("/DCIM/Camera/.thumbnails")
    }

    #[tokio::test]
    async fn test_transfers_and_flags() {
        let temp_dir = TempDir::new().unwrap();
        let device = device();
        let request = TransferRequest::new("/DCIM/Camera", temp_dir.path());

        let report = TransferEngine::new().run(&device, &request).await.unwrap();

        assert_eq!(report.stats.files_transferred, 2);
        assert_eq!(report.stats.bytes_transferred, 10);
        assert_eq!(report.source, "/DCIM/Camera");
        assert_eq!(std::fs::read(temp_dir.path().join("a.mp4")).unwrap(), b"movie");
        assert!(temp_dir.path().join(".mtpcopy-flags/a.mp4").exists());
        assert!(temp_dir.path().join(".mtpcopy-flags/b.txt").exists());
        assert!(!temp_dir.path().join(".thumbnails").exists());
    }

    #[tokio::test]
    async fn test_second_run_skips_everything() {
        let temp_dir = TempDir::new().unwrap();
        let device = device();
        let request = TransferRequest::new("/DCIM/Camera", temp_dir.path());
        let engine = TransferEngine::new();

        engine.run(&device, &request).await.unwrap();
        let second = engine.run(&device, &request).await.unwrap();

        assert_eq!(second.stats.files_transferred, 0);
        assert_eq!(second.stats.files_skipped, 2);
        assert_eq!(device.download_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_target_root_does_not_connect() {
        let temp_dir = TempDir::new().unwrap();
        let device = device();
        let request = TransferRequest::new("/DCIM", temp_dir.path().join("missing"));

        let error = TransferEngine::new().run(&device, &request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TargetRootNotFound);
        assert_eq!(device.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_unsafe_name_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let device = InMemoryDevice::new("evil").with_file("/DCIM", "..", b"x".to_vec());
        let request = TransferRequest::new("/DCIM", temp_dir.path());

        let error = TransferEngine::new().run(&device, &request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsafeName);
        assert_eq!(device.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_list_returns_children() {
        let device = device();
        let entries = TransferEngine::new().list(&device, "/DCIM/Camera/").await.unwrap();
        let names: Vec<_> = entries.iter().map(DeviceEntry::name).collect();
        assert_eq!(names, vec!["a.mp4", "b.txt", ".thumbnails"]);
        assert_eq!(device.disconnect_count(), 1);
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl TransferObserver for Recorder {
        fn on_run_started(&self, _run_id: Uuid, total_files: usize) {
            self.events.lock().unwrap().push(format!("run:{}", total_files));
        }

        fn on_file_started(&self, file: &DeviceFile) {
            self.events.lock().unwrap().push(format!("start:{}", file.name));
        }

        fn on_file_finished(&self, report: &FileReport) {
            let kind = match report.outcome {
                FileOutcome::Skipped => "skip",
                FileOutcome::Transferred { .. } => "done",
            };
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:{}", kind, report.name));
        }
    }

    #[tokio::test]
    async fn test_observer_sees_every_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(".mtpcopy-flags")).unwrap();
        std::fs::write(temp_dir.path().join(".mtpcopy-flags/a.mp4"), b"").unwrap();

        let recorder = Arc::new(Recorder::default());
        let engine = TransferEngine::new().with_observer(recorder.clone());
        let request = TransferRequest::new("/DCIM/Camera", temp_dir.path());
        engine.run(&device(), &request).await.unwrap();

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["run:2", "start:a.mp4", "skip:a.mp4", "start:b.txt", "done:b.txt"]
        );
    }
}

//! Integration tests for mtpcopy
//!
//! These tests drive the transfer engine against in-memory and mounted
//! devices and check what ends up on disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use mtpcopy_device::{InMemoryDevice, MountedDevice};
use mtpcopy_engine::{CompletionTracker, TransferEngine, TransferRequest};
use mtpcopy_tests::{
    ambiguous_device, destination, jpeg_with_capture_time, sample_device, visible_files,
    SAMPLE_CAPTURE_TIME,
};
use mtpcopy_types::{
    CollisionPolicy, ErrorKind, FileOutcome, FileReport, RunId, TransferObserver,
};
use rstest::rstest;
use std::sync::Arc;

const CAMERA: &str = "/Internal storage/DCIM/Camera";
const RENAMED: &str = "2021/03/2021-03-04_15-06-07.jpg";

fn staging_root(dest: &Path) -> PathBuf {
    dest.join(".mtpcopy-temp")
}

fn staging_runs(dest: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(staging_root(dest))
        .map(|entries| entries.flatten().map(|e| e.path()).collect())
        .unwrap_or_default()
}

/// Records whether the run's staging directory existed after each file
#[derive(Default)]
struct StagingWatcher {
    destination: PathBuf,
    run_id: Mutex<Option<RunId>>,
    seen: Mutex<Vec<bool>>,
}

impl StagingWatcher {
    fn new(destination: &Path) -> Self {
        Self {
            destination: destination.to_path_buf(),
            ..Self::default()
        }
    }
}

impl TransferObserver for StagingWatcher {
    fn on_run_started(&self, run_id: RunId, _total_files: usize) {
        *self.run_id.lock().unwrap() = Some(run_id);
    }

    fn on_file_finished(&self, _report: &FileReport) {
        let run_id = self.run_id.lock().unwrap().expect("run started");
        let exists = staging_root(&self.destination)
            .join(run_id.to_string())
            .is_dir();
        self.seen.lock().unwrap().push(exists);
    }
}

#[tokio::test]
async fn test_first_run_transfers_and_renames() {
    let dest = destination();
    let device = sample_device();
    let request = TransferRequest::new(CAMERA, dest.path());

    let report = TransferEngine::new().run(&device, &request).await.unwrap();

    assert_eq!(report.stats.files_transferred, 3);
    assert_eq!(report.stats.files_skipped, 0);
    assert_eq!(
        visible_files(dest.path()),
        vec![RENAMED, "IMG_0002.JPG", "VID_0003.mp4"]
    );
    assert_eq!(
        std::fs::read(dest.path().join(RENAMED)).unwrap(),
        jpeg_with_capture_time(SAMPLE_CAPTURE_TIME)
    );

    let flagged = CompletionTracker::new(dest.path()).list().await.unwrap();
    assert_eq!(flagged, vec!["IMG_0001.jpg", "IMG_0002.JPG", "VID_0003.mp4"]);

    // Staging is gone after success and sub-folders were not descended into
    assert!(!staging_root(dest.path()).exists());
    assert!(!dest.path().join(".thumbnails").exists());
}

#[tokio::test]
async fn test_repeated_runs_are_idempotent() {
    let dest = destination();
    let request = TransferRequest::new(CAMERA, dest.path());

    TransferEngine::new()
        .run(&sample_device(), &request)
        .await
        .unwrap();
    let before = visible_files(dest.path());

    let device = sample_device();
    let report = TransferEngine::new().run(&device, &request).await.unwrap();

    assert_eq!(report.stats.files_transferred, 0);
    assert_eq!(report.stats.files_skipped, 3);
    assert!(report
        .files
        .iter()
        .all(|f| f.outcome == FileOutcome::Skipped));
    assert_eq!(device.download_count(), 0);
    assert_eq!(visible_files(dest.path()), before);
}

#[tokio::test]
async fn test_moved_away_copies_are_not_transferred_again() {
    let dest = destination();
    let request = TransferRequest::new(CAMERA, dest.path());
    TransferEngine::new()
        .run(&sample_device(), &request)
        .await
        .unwrap();

    std::fs::remove_dir_all(dest.path().join("2021")).unwrap();
    std::fs::remove_file(dest.path().join("VID_0003.mp4")).unwrap();

    let report = TransferEngine::new()
        .run(&sample_device(), &request)
        .await
        .unwrap();
    assert_eq!(report.stats.files_transferred, 0);
    assert_eq!(visible_files(dest.path()), vec!["IMG_0002.JPG"]);
}

#[tokio::test]
async fn test_new_files_are_picked_up() {
    let dest = destination();
    let request = TransferRequest::new(CAMERA, dest.path());
    TransferEngine::new()
        .run(&sample_device(), &request)
        .await
        .unwrap();

    let device = sample_device().with_file(CAMERA, "IMG_0004.png", b"png".to_vec());
    let report = TransferEngine::new().run(&device, &request).await.unwrap();

    assert_eq!(report.stats.files_skipped, 3);
    assert_eq!(report.stats.files_transferred, 1);
    assert_eq!(device.download_count(), 1);
    assert!(dest.path().join("IMG_0004.png").exists());
}

#[tokio::test]
async fn test_rename_disabled_keeps_device_names() {
    let dest = destination();
    let request = TransferRequest::new(CAMERA, dest.path()).rename_by_capture_time(false);

    TransferEngine::new()
        .run(&sample_device(), &request)
        .await
        .unwrap();

    assert_eq!(
        visible_files(dest.path()),
        vec!["IMG_0001.jpg", "IMG_0002.JPG", "VID_0003.mp4"]
    );
}

#[rstest]
#[case::overwrite(CollisionPolicy::Overwrite, vec![RENAMED])]
#[case::rename(CollisionPolicy::Rename, vec!["2021/03/2021-03-04_15-06-07 (1).jpg", RENAMED])]
#[tokio::test]
async fn test_flag_lost_after_placement(
    #[case] policy: CollisionPolicy,
    #[case] expected: Vec<&str>,
) {
    let dest = destination();
    let device = InMemoryDevice::new("Pixel").with_file(
        "/DCIM",
        "IMG_0001.jpg",
        jpeg_with_capture_time(SAMPLE_CAPTURE_TIME),
    );
    let request = TransferRequest::new("/DCIM", dest.path()).with_collision_policy(policy);
    TransferEngine::new().run(&device, &request).await.unwrap();

    // The file was placed but the run stopped before the flag was written
    assert!(CompletionTracker::new(dest.path())
        .forget("IMG_0001.jpg")
        .await
        .unwrap());

    let report = TransferEngine::new().run(&device, &request).await.unwrap();
    assert_eq!(report.stats.files_transferred, 1);
    assert_eq!(visible_files(dest.path()), expected);
}

#[tokio::test]
async fn test_fail_policy_aborts_on_existing_target() {
    let dest = destination();
    std::fs::write(dest.path().join("VID_0003.mp4"), b"already here").unwrap();
    let device = sample_device();
    let request = TransferRequest::new(CAMERA, dest.path())
        .with_collision_policy(CollisionPolicy::Fail);

    let error = TransferEngine::new()
        .run(&device, &request)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DestinationExists);
    assert_eq!(
        std::fs::read(dest.path().join("VID_0003.mp4")).unwrap(),
        b"already here"
    );
    let tracker = CompletionTracker::new(dest.path());
    assert!(tracker.is_done("IMG_0002.JPG").await.unwrap());
    assert!(!tracker.is_done("VID_0003.mp4").await.unwrap());
    assert_eq!(device.connect_count(), 1);
    assert_eq!(device.disconnect_count(), 1);
}

#[rstest]
#[case::relative("DCIM", ErrorKind::InvalidPath, 0)]
#[case::empty_segment("/Internal storage//DCIM", ErrorKind::InvalidPath, 0)]
#[case::missing_folder("/Internal storage/Pictures", ErrorKind::DirectoryNotFound, 1)]
#[case::wrong_case("/internal storage/DCIM", ErrorKind::DirectoryNotFound, 1)]
#[tokio::test]
async fn test_preflight_failures_touch_nothing(
    #[case] source: &str,
    #[case] kind: ErrorKind,
    #[case] sessions: usize,
) {
    let dest = destination();
    let device = sample_device();
    let request = TransferRequest::new(source, dest.path());

    let error = TransferEngine::new()
        .run(&device, &request)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), kind);
    assert!(error.is_preflight());
    assert_eq!(device.connect_count(), sessions);
    assert_eq!(device.disconnect_count(), sessions);
    assert_eq!(device.download_count(), 0);
    assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_missing_target_root_is_checked_before_connecting() {
    let dest = destination();
    let device = sample_device();
    let request = TransferRequest::new(CAMERA, dest.path().join("not-there"));

    let error = TransferEngine::new()
        .run(&device, &request)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::TargetRootNotFound);
    assert_eq!(device.connect_count(), 0);
    assert!(!dest.path().join("not-there").exists());
}

#[tokio::test]
async fn test_ambiguous_folder_is_not_found() {
    let dest = destination();
    let device = ambiguous_device();

    let error = TransferEngine::new()
        .run(&device, &TransferRequest::new("/A", dest.path()))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DirectoryNotFound);
    assert_eq!(device.disconnect_count(), 1);
}

#[tokio::test]
async fn test_transport_failure_aborts_and_keeps_staging() {
    let dest = destination();
    let request = TransferRequest::new(CAMERA, dest.path());
    let device = sample_device().fail_download_of("IMG_0002.JPG");

    let error = TransferEngine::new()
        .run(&device, &request)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Transport);
    assert_eq!(device.connect_count(), 1);
    assert_eq!(device.disconnect_count(), 1);
    assert!(!device.is_connected());

    // The file before the failure is complete and flagged, later files untouched
    assert_eq!(visible_files(dest.path()), vec![RENAMED]);
    let tracker = CompletionTracker::new(dest.path());
    assert_eq!(tracker.list().await.unwrap(), vec!["IMG_0001.jpg"]);
    assert_eq!(staging_runs(dest.path()).len(), 1);

    // The next run resumes with the remaining files and leaves the old staging alone
    let report = TransferEngine::new()
        .run(&sample_device(), &request)
        .await
        .unwrap();
    assert_eq!(report.stats.files_skipped, 1);
    assert_eq!(report.stats.files_transferred, 2);
    assert_eq!(staging_runs(dest.path()).len(), 1);
}

#[tokio::test]
async fn test_staging_exists_during_run() {
    let dest = destination();
    let watcher = Arc::new(StagingWatcher::new(dest.path()));
    let engine = TransferEngine::new().with_observer(watcher.clone());

    engine
        .run(&sample_device(), &TransferRequest::new(CAMERA, dest.path()))
        .await
        .unwrap();

    assert_eq!(*watcher.seen.lock().unwrap(), vec![true, true, true]);
    assert!(!staging_root(dest.path()).exists());
}

#[tokio::test]
async fn test_unsafe_device_name_aborts() {
    let dest = destination();
    let device = InMemoryDevice::new("odd")
        .with_file("/DCIM", "ok.txt", b"fine".to_vec())
        .with_file("/DCIM", "..", b"nope".to_vec());

    let error = TransferEngine::new()
        .run(&device, &TransferRequest::new("/DCIM", dest.path()))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnsafeName);
    assert!(dest.path().join("ok.txt").exists());
    assert_eq!(device.disconnect_count(), 1);
}

#[rstest]
#[case(".mtpcopy-flags")]
#[case(".mtpcopy-temp")]
#[tokio::test]
async fn test_reserved_device_name_never_lands_in_destination(#[case] name: &str) {
    let dest = destination();
    let device = InMemoryDevice::new("odd")
        .with_file("/DCIM", name, b"nope".to_vec())
        .with_file("/DCIM", "b.txt", b"fine".to_vec());

    for _ in 0..2 {
        let error = TransferEngine::new()
            .run(&device, &TransferRequest::new("/DCIM", dest.path()))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsafeName);
    }

    assert!(!dest.path().join(".mtpcopy-flags").is_file());
    assert!(!dest.path().join(".mtpcopy-temp").is_file());
    assert_eq!(device.disconnect_count(), 2);
}

#[tokio::test]
async fn test_mounted_device_end_to_end() {
    let mount = tempfile::TempDir::new().unwrap();
    let camera = mount.path().join("DCIM/Camera");
    std::fs::create_dir_all(camera.join("thumbs")).unwrap();
    std::fs::write(
        camera.join("PXL_1.jpg"),
        jpeg_with_capture_time("2023:12:31 23:59:58"),
    )
    .unwrap();
    std::fs::write(camera.join("notes.txt"), b"hello").unwrap();
    std::fs::write(camera.join("thumbs/PXL_1.jpg"), b"thumb").unwrap();

    let dest = destination();
    let device = MountedDevice::with_name("Pixel", mount.path());
    let request = TransferRequest::new("/DCIM/Camera/", dest.path());

    let report = TransferEngine::new().run(&device, &request).await.unwrap();
    assert_eq!(report.source, "/DCIM/Camera");
    assert_eq!(report.stats.files_transferred, 2);
    assert_eq!(
        visible_files(dest.path()),
        vec!["2023/12/2023-12-31_23-59-58.jpg", "notes.txt"]
    );

    // Device files stay where they are
    assert!(camera.join("PXL_1.jpg").exists());

    let again = TransferEngine::new().run(&device, &request).await.unwrap();
    assert_eq!(again.stats.files_skipped, 2);
}

#[tokio::test]
async fn test_listing_a_device_directory() {
    let device = sample_device();
    let entries = TransferEngine::new()
        .list(&device, "/Internal storage/DCIM/Camera")
        .await
        .unwrap();

    let names: Vec<_> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec!["IMG_0001.jpg", "IMG_0002.JPG", "VID_0003.mp4", ".thumbnails"]
    );
    assert_eq!(device.connect_count(), 1);
    assert_eq!(device.disconnect_count(), 1);
}

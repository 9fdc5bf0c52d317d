use chrono::{DateTime, TimeZone, Utc};
use notes::catalog::{Catalog, CatalogEntry, CatalogHandle, CatalogUpdate, ReloadReason, SyncMode};
use notes::error::{NotesError, Result};
use notes::package::FileWrapper;
use notes::settings::{MemSettingsStore, Settings};
use notes::store::{DownloadStatus, ManualQuery, MemBackend, QueryItem, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

struct Harness {
    backend: Arc<MemBackend>,
    query: ManualQuery,
    settings: MemSettingsStore,
    catalog: CatalogHandle,
    updates: UnboundedReceiver<CatalogUpdate>,
}

fn prompted(use_cloud: bool) -> MemSettingsStore {
    MemSettingsStore::new(Settings {
        use_cloud,
        has_prompted: true,
    })
}

fn setup(backend: MemBackend, settings: MemSettingsStore) -> Harness {
    let backend = Arc::new(backend);
    let query = ManualQuery::new();
    let (catalog, updates) = Catalog::spawn(Arc::clone(&backend), query.clone(), settings.clone());
    Harness {
        backend,
        query,
        settings,
        catalog,
        updates,
    }
}

/// Holds up the first move into the cloud directory.
struct SlowFirstMove {
    inner: MemBackend,
    delay: Duration,
    delayed: AtomicBool,
}

impl SlowFirstMove {
    fn new(inner: MemBackend, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            delayed: AtomicBool::new(false),
        }
    }
}

impl StorageBackend for SlowFirstMove {
    fn local_documents_dir(&self) -> &Path {
        self.inner.local_documents_dir()
    }

    fn cloud_documents_dir(&self) -> Option<&Path> {
        self.inner.cloud_documents_dir()
    }

    fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.inner.list_directory(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.inner.modified(path)
    }

    fn set_ubiquitous(&self, item: &Path, destination: &Path) -> Result<()> {
        if !self.delayed.swap(true, Ordering::SeqCst) {
            std::thread::sleep(self.delay);
        }
        self.inner.set_ubiquitous(item, destination)
    }

    fn download_status(&self, item: &Path) -> Result<DownloadStatus> {
        self.inner.download_status(item)
    }

    fn start_downloading(&self, item: &Path) -> Result<()> {
        self.inner.start_downloading(item)
    }

    fn read_package(&self, path: &Path) -> Result<FileWrapper> {
        self.inner.read_package(path)
    }

    fn write_package(&self, path: &Path, package: &FileWrapper) -> Result<()> {
        self.inner.write_package(path, package)
    }
}

fn note() -> FileWrapper {
    FileWrapper::directory()
}

fn names(entries: &[CatalogEntry]) -> Vec<String> {
    let mut names: Vec<String> = entries.iter().map(|e| e.display_name.clone()).collect();
    names.sort();
    names
}

fn find<'a>(entries: &'a [CatalogEntry], location: &Path) -> Option<&'a CatalogEntry> {
    entries.iter().find(|e| e.location == location)
}

async fn reloaded(
    updates: &mut UnboundedReceiver<CatalogUpdate>,
    wanted: ReloadReason,
) -> Vec<CatalogEntry> {
    let wait = async {
        loop {
            match updates.recv().await {
                Some(CatalogUpdate::Reloaded { reason, entries }) if reason == wanted => {
                    return entries
                }
                Some(_) => continue,
                None => panic!("catalog closed before {:?}", wanted),
            }
        }
    };
    timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for catalog")
}

#[tokio::test]
async fn test_local_scan_lists_direct_note_children() {
    let backend = MemBackend::local_only();
    backend.insert("/local/a.note", note());
    backend.insert("/local/b.note", note());
    backend.insert("/local/c.txt", FileWrapper::regular("plain"));
    backend.insert("/local/sub/d.note", note());
    let mut h = setup(backend, prompted(false));

    assert_eq!(h.catalog.start().await.unwrap(), Some(SyncMode::Local));
    let started = reloaded(&mut h.updates, ReloadReason::Started).await;
    assert_eq!(names(&started), vec!["a.note", "b.note"]);
    assert!(started.iter().all(|e| e.openable));
    assert_eq!(h.query.start_count(), 0);
}

#[tokio::test]
async fn test_cloud_setting_without_cloud_dir_stays_local() {
    let backend = MemBackend::local_only();
    backend.insert("/local/a.note", note());
    let h = setup(backend, prompted(true));

    assert_eq!(h.catalog.start().await.unwrap(), Some(SyncMode::Local));
    assert_eq!(h.query.start_count(), 0);
    assert_eq!(names(&h.catalog.snapshot().await.unwrap()), vec!["a.note"]);
}

#[tokio::test]
async fn test_first_run_waits_for_mode_choice() {
    let backend = MemBackend::new();
    backend.insert("/local/a.note", note());
    let mut h = setup(backend, MemSettingsStore::default());

    assert_eq!(h.catalog.start().await.unwrap(), None);
    assert_eq!(h.updates.recv().await, Some(CatalogUpdate::PromptForMode));
    assert!(h.catalog.snapshot().await.unwrap().is_empty());
    assert_eq!(h.query.start_count(), 0);
    assert!(!h.settings.current().has_prompted);

    assert_eq!(
        h.catalog.choose_mode(SyncMode::Local).await.unwrap(),
        SyncMode::Local
    );
    let scanned = reloaded(&mut h.updates, ReloadReason::LocalScan).await;
    assert_eq!(names(&scanned), vec!["a.note"]);
    assert_eq!(h.query.start_count(), 0);
    assert!(h.settings.current().has_prompted);
    assert!(!h.settings.current().use_cloud);
}

#[tokio::test]
async fn test_choosing_cloud_starts_search() {
    let mut h = setup(MemBackend::new(), MemSettingsStore::default());
    assert_eq!(h.catalog.start().await.unwrap(), None);

    assert_eq!(
        h.catalog.choose_mode(SyncMode::Cloud).await.unwrap(),
        SyncMode::Cloud
    );
    assert_eq!(h.query.start_count(), 1);
    assert!(h.settings.current().use_cloud);

    h.backend.insert("/cloud/remote.note", note());
    assert!(h
        .query
        .finish_gathering(vec![QueryItem::at("/cloud/remote.note")]));
    let gathered = reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    assert_eq!(names(&gathered), vec!["remote.note"]);
}

#[tokio::test]
async fn test_cloud_start_moves_local_notes() {
    let backend = MemBackend::new();
    backend.insert("/local/a.note", note());
    let mut h = setup(backend, prompted(true));

    assert_eq!(h.catalog.start().await.unwrap(), Some(SyncMode::Cloud));
    h.catalog.settle().await.unwrap();
    assert_eq!(
        h.backend.moves(),
        vec![(PathBuf::from("/local/a.note"), PathBuf::from("/cloud/a.note"))]
    );

    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/a.note")]));
    let gathered = reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    assert_eq!(gathered.len(), 1);
    assert_eq!(gathered[0].location, PathBuf::from("/cloud/a.note"));
    assert!(gathered[0].openable);
}

#[tokio::test]
async fn test_not_downloaded_item_requests_one_download() {
    let backend = MemBackend::new();
    backend.insert_with_status("/cloud/r.note", note(), DownloadStatus::NotDownloaded);
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/r.note")]));
    reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    h.catalog.settle().await.unwrap();

    assert_eq!(h.backend.download_requests(), vec![PathBuf::from("/cloud/r.note")]);
    let entries = h.catalog.snapshot().await.unwrap();
    assert!(!find(&entries, Path::new("/cloud/r.note")).unwrap().openable);
}

#[tokio::test]
async fn test_failed_download_request_keeps_entry() {
    let backend = MemBackend::new();
    backend.insert_with_status("/cloud/r.note", note(), DownloadStatus::Downloaded);
    backend.set_simulate_download_error(true);
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/r.note")]));
    reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    h.catalog.settle().await.unwrap();

    assert_eq!(h.backend.download_requests().len(), 1);
    assert_eq!(names(&h.catalog.snapshot().await.unwrap()), vec!["r.note"]);
}

#[tokio::test]
async fn test_status_error_means_not_openable() {
    let backend = MemBackend::new();
    backend.insert("/cloud/odd.note", note());
    backend.fail_status_for("/cloud/odd.note");
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/odd.note")]));
    let gathered = reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    assert_eq!(gathered.len(), 1);
    assert!(!gathered[0].openable);
}

#[tokio::test]
async fn test_unresolvable_results_are_skipped() {
    let backend = MemBackend::new();
    backend.insert("/cloud/x.note", note());
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    assert!(h.query.finish_gathering(vec![
        QueryItem::unresolved("ghost.note"),
        QueryItem::at("/cloud/x.note"),
        QueryItem::at("/cloud/x.note"),
    ]));
    let gathered = reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    assert_eq!(names(&gathered), vec!["x.note", "x.note"]);
}

#[tokio::test]
async fn test_failed_migration_stays_visible() {
    let backend = MemBackend::new();
    backend.insert("/local/stuck.note", note());
    backend.insert("/cloud/b.note", note());
    backend.set_simulate_move_error(true);
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    let started = reloaded(&mut h.updates, ReloadReason::Started).await;
    assert_eq!(names(&started), vec!["stuck.note"]);

    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/b.note")]));
    let gathered = reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    assert!(find(&gathered, Path::new("/local/stuck.note")).is_some());
    assert!(find(&gathered, Path::new("/cloud/b.note")).is_some());
    assert!(h.backend.exists(Path::new("/local/stuck.note")));
}

#[tokio::test]
async fn test_update_replaces_entries() {
    let backend = MemBackend::new();
    backend.insert("/cloud/one.note", note());
    backend.insert("/cloud/two.note", note());
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/one.note")]));
    reloaded(&mut h.updates, ReloadReason::QueryGathered).await;

    assert!(h.query.update(vec![QueryItem::at("/cloud/two.note")]));
    let updated = reloaded(&mut h.updates, ReloadReason::QueryUpdated).await;
    assert_eq!(names(&updated), vec!["two.note"]);
}

#[tokio::test]
async fn test_switching_to_local_stops_search() {
    let backend = MemBackend::new();
    backend.insert("/cloud/remote.note", note());
    backend.insert("/local/here.note", note());
    backend.set_simulate_move_error(true);
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();
    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/remote.note")]));
    reloaded(&mut h.updates, ReloadReason::QueryGathered).await;

    assert_eq!(
        h.catalog.choose_mode(SyncMode::Local).await.unwrap(),
        SyncMode::Local
    );
    let scanned = reloaded(&mut h.updates, ReloadReason::LocalScan).await;
    assert_eq!(names(&scanned), vec!["here.note"]);
    assert!(!h.query.finish_gathering(vec![QueryItem::at("/cloud/remote.note")]));
}

#[tokio::test]
async fn test_create_in_cloud_mode_moves_note() {
    let mut h = setup(MemBackend::new(), prompted(true));
    h.catalog.start().await.unwrap();

    let path = h.catalog.create_note().await.unwrap();
    assert_eq!(path.parent(), Some(Path::new("/cloud")));
    assert!(h.backend.exists(&path));
    let created = reloaded(&mut h.updates, ReloadReason::NoteCreated).await;
    assert!(find(&created, &path).is_some());

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Document "));
    assert!(name.ends_with(".note"));
}

#[tokio::test]
async fn test_create_in_local_mode_stays_local() {
    let mut h = setup(MemBackend::new(), prompted(false));
    h.catalog.start().await.unwrap();

    let path = h.catalog.create_note().await.unwrap();
    assert_eq!(path.parent(), Some(Path::new("/local")));
    assert!(h.backend.moves().is_empty());
    let created = reloaded(&mut h.updates, ReloadReason::NoteCreated).await;
    assert_eq!(created.len(), 1);
}

#[tokio::test]
async fn test_create_with_failed_move_returns_local_path() {
    let backend = MemBackend::new();
    backend.set_simulate_move_error(true);
    let h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    let path = h.catalog.create_note().await.unwrap();
    assert_eq!(path.parent(), Some(Path::new("/local")));
    assert!(h.backend.exists(&path));
}

#[tokio::test]
async fn test_delete_and_rename_are_unsupported() {
    let backend = MemBackend::local_only();
    backend.insert("/local/a.note", note());
    let h = setup(backend, prompted(false));
    h.catalog.start().await.unwrap();

    assert!(matches!(
        h.catalog.delete_note(PathBuf::from("/local/a.note")).await,
        Err(NotesError::Unsupported(_))
    ));
    assert!(matches!(
        h.catalog
            .rename_note(PathBuf::from("/local/a.note"), "b".to_string())
            .await,
        Err(NotesError::Unsupported(_))
    ));
    assert!(h.backend.exists(Path::new("/local/a.note")));
}

#[tokio::test]
async fn test_handle_fails_after_shutdown() {
    let h = setup(MemBackend::local_only(), prompted(false));
    h.catalog.shutdown().await.unwrap();
    assert!(matches!(
        h.catalog.snapshot().await,
        Err(NotesError::Api(_))
    ));
}

#[tokio::test]
async fn test_next_cycle_sees_finished_download() {
    let backend = MemBackend::new();
    backend.insert_with_status("/cloud/r.note", note(), DownloadStatus::NotDownloaded);
    let mut h = setup(backend, prompted(true));
    h.catalog.start().await.unwrap();

    assert!(h.query.finish_gathering(vec![QueryItem::at("/cloud/r.note")]));
    let gathered = reloaded(&mut h.updates, ReloadReason::QueryGathered).await;
    assert!(!gathered[0].openable);
    h.catalog.settle().await.unwrap();

    let location = Path::new("/cloud/r.note");
    let stamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    assert!(h.backend.set_status(location, DownloadStatus::Current));
    assert!(h.backend.set_modified(location, stamp));

    assert!(h.query.update(vec![QueryItem::at("/cloud/r.note")]));
    let updated = reloaded(&mut h.updates, ReloadReason::QueryUpdated).await;
    assert!(updated[0].openable);
    assert_eq!(updated[0].modified, Some(stamp));
    h.catalog.settle().await.unwrap();
    assert_eq!(h.backend.download_requests().len(), 1);
}

#[tokio::test]
async fn test_slow_move_does_not_block_catalog() {
    let inner = MemBackend::new();
    inner.insert("/local/big.note", note());
    let backend = Arc::new(SlowFirstMove::new(inner, Duration::from_secs(1)));
    let (catalog, _updates) =
        Catalog::spawn(Arc::clone(&backend), ManualQuery::new(), prompted(true));
    let quick = Duration::from_millis(250);

    let mode = timeout(quick, catalog.start()).await.unwrap().unwrap();
    assert_eq!(mode, Some(SyncMode::Cloud));
    let entries = timeout(quick, catalog.snapshot()).await.unwrap().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].location, PathBuf::from("/local/big.note"));

    catalog.settle().await.unwrap();
    assert_eq!(
        backend.inner.moves(),
        vec![(PathBuf::from("/local/big.note"), PathBuf::from("/cloud/big.note"))]
    );
    let entries = catalog.snapshot().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].location, PathBuf::from("/cloud/big.note"));
}

#[tokio::test]
async fn test_cycle_during_new_note_move_moves_it_once() {
    let backend = Arc::new(SlowFirstMove::new(
        MemBackend::new(),
        Duration::from_millis(300),
    ));
    let query = ManualQuery::new();
    let (catalog, mut updates) =
        Catalog::spawn(Arc::clone(&backend), query.clone(), prompted(true));
    assert_eq!(catalog.start().await.unwrap(), Some(SyncMode::Cloud));

    let creating = tokio::spawn({
        let catalog = catalog.clone();
        async move { catalog.create_note().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(query.update(vec![]));
    let updated = reloaded(&mut updates, ReloadReason::QueryUpdated).await;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].location.parent(), Some(Path::new("/local")));

    let path = creating.await.unwrap().unwrap();
    assert_eq!(path.parent(), Some(Path::new("/cloud")));
    assert!(backend.inner.exists(&path));
    assert_eq!(backend.inner.moves().len(), 1);

    let entries = catalog.snapshot().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].location, path);
}

use super::backend::{DownloadStatus, StorageBackend};
use crate::error::{NotesError, Result};
use crate::package::FileWrapper;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Clone)]
struct MemItem {
    package: FileWrapper,
    status: DownloadStatus,
    modified: DateTime<Utc>,
}

#[derive(Default)]
struct MemState {
    items: BTreeMap<PathBuf, MemItem>,
    download_requests: Vec<PathBuf>,
    moves: Vec<(PathBuf, PathBuf)>,
    simulate_move_error: bool,
    simulate_download_error: bool,
    simulate_write_error: bool,
    status_errors: HashSet<PathBuf>,
}

/// In-memory storage backend for testing.
///
/// Paths are virtual: the local directory is `/local` and the cloud directory
/// `/cloud` unless built with [`MemBackend::local_only`]. Every item is keyed by
/// its full path, so listing a directory only ever returns direct children.
/// Moves and download requests are recorded for inspection.
pub struct MemBackend {
    local_dir: PathBuf,
    cloud_dir: Option<PathBuf>,
    state: Mutex<MemState>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self {
            local_dir: PathBuf::from("/local"),
            cloud_dir: Some(PathBuf::from("/cloud")),
            state: Mutex::new(MemState::default()),
        }
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with no cloud account.
    pub fn local_only() -> Self {
        Self {
            cloud_dir: None,
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn local_path(&self, name: &str) -> PathBuf {
        self.local_dir.join(name)
    }

    /// Stores `package` at `path` as a fully downloaded item.
    pub fn insert(&self, path: impl Into<PathBuf>, package: FileWrapper) {
        self.insert_with_status(path, package, DownloadStatus::Current);
    }

    pub fn insert_with_status(
        &self,
        path: impl Into<PathBuf>,
        package: FileWrapper,
        status: DownloadStatus,
    ) {
        self.state().items.insert(
            path.into(),
            MemItem {
                package,
                status,
                modified: Utc::now(),
            },
        );
    }

    pub fn set_status(&self, path: &Path, status: DownloadStatus) -> bool {
        match self.state().items.get_mut(path) {
            Some(item) => {
                item.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_modified(&self, path: &Path, modified: DateTime<Utc>) -> bool {
        match self.state().items.get_mut(path) {
            Some(item) => {
                item.modified = modified;
                true
            }
            None => false,
        }
    }

    pub fn set_simulate_move_error(&self, simulate: bool) {
        self.state().simulate_move_error = simulate;
    }

    pub fn set_simulate_download_error(&self, simulate: bool) {
        self.state().simulate_download_error = simulate;
    }

    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.state().simulate_write_error = simulate;
    }

    /// Makes status queries for `path` fail.
    pub fn fail_status_for(&self, path: impl Into<PathBuf>) {
        self.state().status_errors.insert(path.into());
    }

    pub fn download_requests(&self) -> Vec<PathBuf> {
        self.state().download_requests.clone()
    }

    pub fn moves(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state().moves.clone()
    }
}

impl StorageBackend for MemBackend {
    fn local_documents_dir(&self) -> &Path {
        &self.local_dir
    }

    fn cloud_documents_dir(&self) -> Option<&Path> {
        self.cloud_dir.as_deref()
    }

    fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .state()
            .items
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.state().items.contains_key(path)
    }

    fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.state().items.get(path).map(|item| item.modified)
    }

    fn set_ubiquitous(&self, item: &Path, destination: &Path) -> Result<()> {
        let mut state = self.state();
        if state.simulate_move_error {
            return Err(NotesError::Store("Simulated move error".to_string()));
        }
        if state.items.contains_key(destination) {
            return Err(NotesError::Store(format!(
                "{} already exists",
                destination.display()
            )));
        }
        let entry = state
            .items
            .remove(item)
            .ok_or_else(|| NotesError::CannotAccessDocument(item.to_path_buf()))?;
        state.items.insert(destination.to_path_buf(), entry);
        state
            .moves
            .push((item.to_path_buf(), destination.to_path_buf()));
        Ok(())
    }

    fn download_status(&self, item: &Path) -> Result<DownloadStatus> {
        let state = self.state();
        if state.status_errors.contains(item) {
            return Err(NotesError::Store("Simulated status error".to_string()));
        }
        state
            .items
            .get(item)
            .map(|entry| entry.status)
            .ok_or_else(|| NotesError::CannotAccessDocument(item.to_path_buf()))
    }

    fn start_downloading(&self, item: &Path) -> Result<()> {
        let mut state = self.state();
        state.download_requests.push(item.to_path_buf());
        if state.simulate_download_error {
            return Err(NotesError::Store("Simulated download error".to_string()));
        }
        Ok(())
    }

    fn read_package(&self, path: &Path) -> Result<FileWrapper> {
        self.state()
            .items
            .get(path)
            .map(|item| item.package.clone())
            .ok_or_else(|| NotesError::CannotAccessDocument(path.to_path_buf()))
    }

    fn write_package(&self, path: &Path, package: &FileWrapper) -> Result<()> {
        let mut state = self.state();
        if state.simulate_write_error {
            return Err(NotesError::Store("Simulated write error".to_string()));
        }
        state.items.insert(
            path.to_path_buf(),
            MemItem {
                package: package.clone(),
                status: DownloadStatus::Current,
                modified: Utc::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_direct_children() {
        let backend = MemBackend::new();
        backend.insert("/local/a.note", FileWrapper::directory());
        backend.insert("/local/sub/b.note", FileWrapper::directory());
        backend.insert("/cloud/c.note", FileWrapper::directory());

        let listed = backend.list_directory(Path::new("/local")).unwrap();
        assert_eq!(listed, vec![PathBuf::from("/local/a.note")]);
    }

    #[test]
    fn move_refuses_existing_destination() {
        let backend = MemBackend::new();
        backend.insert("/local/a.note", FileWrapper::directory());
        backend.insert("/cloud/a.note", FileWrapper::directory());

        let result =
            backend.set_ubiquitous(Path::new("/local/a.note"), Path::new("/cloud/a.note"));
        assert!(matches!(result, Err(NotesError::Store(_))));
        assert!(backend.exists(Path::new("/local/a.note")));
        assert!(backend.moves().is_empty());
    }

    #[test]
    fn download_requests_are_recorded_even_on_failure() {
        let backend = MemBackend::new();
        backend.set_simulate_download_error(true);
        assert!(backend.start_downloading(Path::new("/cloud/x.note")).is_err());
        assert_eq!(
            backend.download_requests(),
            vec![PathBuf::from("/cloud/x.note")]
        );
    }
}

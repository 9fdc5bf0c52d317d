use crate::error::Result;
use crate::package::FileWrapper;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Download state of an item in the cloud directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    /// Only a placeholder exists locally.
    NotDownloaded,
    /// A local copy exists but a newer remote version is pending.
    Downloaded,
    /// The local copy is the latest version.
    Current,
}

/// Abstract interface for raw storage I/O.
///
/// This trait covers the "how" of storage (real directories vs memory), while
/// the catalog and the document host decide "what" to do with it. Backends are
/// shared between the catalog task and its background work, hence `Send + Sync`.
pub trait StorageBackend: Send + Sync + 'static {
    // --- Locations ---

    /// Directory holding notes that live only on this device.
    fn local_documents_dir(&self) -> &Path;

    /// Directory synchronized with the cloud, or `None` when no cloud account
    /// is available.
    fn cloud_documents_dir(&self) -> Option<&Path>;

    // --- Discovery ---

    /// Immediate children of `dir`; never descends into packages or
    /// subdirectories. A missing directory lists as empty.
    fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    fn exists(&self, path: &Path) -> bool;

    /// Modification time, `None` when unknown.
    fn modified(&self, path: &Path) -> Option<DateTime<Utc>>;

    // --- Cloud ---

    /// Moves `item` to `destination`, handing it over to (or back from) the
    /// sync client. Fails if `destination` exists.
    fn set_ubiquitous(&self, item: &Path, destination: &Path) -> Result<()>;

    fn download_status(&self, item: &Path) -> Result<DownloadStatus>;

    /// Asks for `item` to be materialized. Returns once the request is made,
    /// not when the download completes.
    fn start_downloading(&self, item: &Path) -> Result<()>;

    // --- Packages ---

    /// Reads a whole package. Missing paths fail with `CannotAccessDocument`.
    fn read_package(&self, path: &Path) -> Result<FileWrapper>;

    /// Writes a whole package. MUST be atomic: readers see either the old or
    /// the new package, never a mix.
    fn write_package(&self, path: &Path, package: &FileWrapper) -> Result<()>;
}

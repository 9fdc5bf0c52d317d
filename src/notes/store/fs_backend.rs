use super::backend::{DownloadStatus, StorageBackend};
use crate::error::{NotesError, Result};
use crate::package::FileWrapper;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use uuid::Uuid;

/// Suffix sync clients give to the stand-in of a file that is not downloaded:
/// `Foo.note` is represented by `.Foo.note.icloud` until it is fetched.
pub const PLACEHOLDER_SUFFIX: &str = ".icloud";

/// Filesystem backend over a local notes directory and an optional directory
/// kept in sync by an external cloud client.
pub struct FsBackend {
    local_dir: PathBuf,
    cloud_dir: Option<PathBuf>,
    download_command: Option<String>,
}

impl FsBackend {
    pub fn new(local_dir: PathBuf, cloud_dir: Option<PathBuf>) -> Self {
        Self {
            local_dir,
            cloud_dir,
            download_command: None,
        }
    }

    /// Command run with the item path appended to request a download, e.g.
    /// `brctl download`.
    pub fn with_download_command(mut self, command: Option<String>) -> Self {
        self.download_command = command.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn download_command(&self) -> Option<&str> {
        self.download_command.as_deref()
    }

    /// Placeholder path that stands in for `item` while it is not downloaded.
    pub fn placeholder_path(item: &Path) -> Option<PathBuf> {
        let name = item.file_name()?.to_str()?;
        Some(item.with_file_name(format!(".{}{}", name, PLACEHOLDER_SUFFIX)))
    }

    /// The item a placeholder stands in for, `None` if `path` is not a
    /// well-formed placeholder.
    pub fn resolve_placeholder(path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?.to_str()?;
        let inner = name.strip_prefix('.')?.strip_suffix(PLACEHOLDER_SUFFIX)?;
        if inner.is_empty() || inner.starts_with('.') {
            return None;
        }
        Some(path.with_file_name(inner))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(NotesError::Io)?;
        }
        Ok(())
    }

    fn parent_of(path: &Path) -> Result<&Path> {
        path.parent()
            .ok_or_else(|| NotesError::Store(format!("{} has no parent", path.display())))
    }

    fn sibling_temp(path: &Path, kind: &str) -> Result<PathBuf> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NotesError::Store(format!("bad package name {}", path.display())))?;
        Ok(Self::parent_of(path)?.join(format!(".{}-{}.{}", name, Uuid::new_v4(), kind)))
    }

    fn copy_then_remove(item: &Path, destination: &Path) -> Result<()> {
        let tree = FileWrapper::read_from(item).map_err(NotesError::Io)?;
        if let Err(e) = tree.write_to(destination) {
            let _ = remove_path(destination);
            return Err(NotesError::Io(e));
        }
        remove_path(item).map_err(NotesError::Io)
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

impl StorageBackend for FsBackend {
    fn local_documents_dir(&self) -> &Path {
        &self.local_dir
    }

    fn cloud_documents_dir(&self) -> Option<&Path> {
        self.cloud_dir.as_deref().filter(|dir| dir.is_dir())
    }

    fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(NotesError::Io)? {
            let entry = entry.map_err(NotesError::Io)?;
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    fn set_ubiquitous(&self, item: &Path, destination: &Path) -> Result<()> {
        if !item.exists() {
            return Err(NotesError::CannotAccessDocument(item.to_path_buf()));
        }
        if destination.exists() {
            return Err(NotesError::Store(format!(
                "{} already exists",
                destination.display()
            )));
        }
        self.ensure_dir(Self::parent_of(destination)?)?;

        // Different volumes cannot be renamed across.
        if fs::rename(item, destination).is_err() {
            Self::copy_then_remove(item, destination)?;
        }
        Ok(())
    }

    fn download_status(&self, item: &Path) -> Result<DownloadStatus> {
        let present = item.exists();
        let placeholder = Self::placeholder_path(item)
            .map(|p| p.exists())
            .unwrap_or(false);
        match (present, placeholder) {
            (true, false) => Ok(DownloadStatus::Current),
            (true, true) => Ok(DownloadStatus::Downloaded),
            (false, true) => Ok(DownloadStatus::NotDownloaded),
            (false, false) => Err(NotesError::CannotAccessDocument(item.to_path_buf())),
        }
    }

    fn start_downloading(&self, item: &Path) -> Result<()> {
        if self.download_status(item)? == DownloadStatus::Current {
            return Ok(());
        }
        let command = self
            .download_command
            .as_deref()
            .ok_or_else(|| NotesError::Store("no download command configured".to_string()))?;

        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| NotesError::Store("empty download command".to_string()))?;
        let status = Command::new(program)
            .args(parts)
            .arg(item)
            .status()
            .map_err(NotesError::Io)?;
        if !status.success() {
            return Err(NotesError::Store(format!(
                "download command `{}` exited with {}",
                command, status
            )));
        }
        Ok(())
    }

    fn read_package(&self, path: &Path) -> Result<FileWrapper> {
        if !path.exists() {
            return Err(NotesError::CannotAccessDocument(path.to_path_buf()));
        }
        FileWrapper::read_from(path).map_err(NotesError::Io)
    }

    fn write_package(&self, path: &Path, package: &FileWrapper) -> Result<()> {
        self.ensure_dir(Self::parent_of(path)?)?;

        // Build the new tree beside the target, then swap it in.
        let tmp_path = Self::sibling_temp(path, "tmp")?;
        if let Err(e) = package.write_to(&tmp_path) {
            let _ = remove_path(&tmp_path);
            return Err(NotesError::Io(e));
        }

        if !path.exists() {
            return fs::rename(&tmp_path, path).map_err(|e| {
                let _ = remove_path(&tmp_path);
                NotesError::Io(e)
            });
        }

        // Directories cannot be renamed over a non-empty target.
        let old_path = Self::sibling_temp(path, "old")?;
        fs::rename(path, &old_path).map_err(|e| {
            let _ = remove_path(&tmp_path);
            NotesError::Io(e)
        })?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::rename(&old_path, path);
            let _ = remove_path(&tmp_path);
            return Err(NotesError::Io(e));
        }
        remove_path(&old_path).map_err(NotesError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_names_round_trip() {
        let item = Path::new("/cloud/Document 7.note");
        let placeholder = FsBackend::placeholder_path(item).unwrap();
        assert_eq!(placeholder, Path::new("/cloud/.Document 7.note.icloud"));
        assert_eq!(
            FsBackend::resolve_placeholder(&placeholder).unwrap(),
            item.to_path_buf()
        );
    }

    #[test]
    fn malformed_placeholders_do_not_resolve() {
        assert!(FsBackend::resolve_placeholder(Path::new("/c/.icloud")).is_none());
        assert!(FsBackend::resolve_placeholder(Path::new("/c/..icloud")).is_none());
        assert!(FsBackend::resolve_placeholder(Path::new("/c/a.note")).is_none());
    }

    #[test]
    fn blank_download_command_is_ignored() {
        let backend = FsBackend::new(PathBuf::from("/l"), None)
            .with_download_command(Some("   ".to_string()));
        assert_eq!(backend.download_command(), None);
    }
}

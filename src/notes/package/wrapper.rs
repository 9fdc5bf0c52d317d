use super::Slot;
use crate::error::{NotesError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// In-memory tree of a package: regular files and named directories.
///
/// Directory entry names are unique; inserting under an existing name
/// replaces the previous entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileWrapper {
    Regular(Vec<u8>),
    Directory(BTreeMap<String, FileWrapper>),
}

impl Default for FileWrapper {
    fn default() -> Self {
        Self::directory()
    }
}

impl FileWrapper {
    pub fn directory() -> Self {
        FileWrapper::Directory(BTreeMap::new())
    }

    pub fn regular(contents: impl Into<Vec<u8>>) -> Self {
        FileWrapper::Regular(contents.into())
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FileWrapper::Directory(_))
    }

    /// Bytes of a regular file, `None` for directories.
    pub fn regular_contents(&self) -> Option<&[u8]> {
        match self {
            FileWrapper::Regular(bytes) => Some(bytes),
            FileWrapper::Directory(_) => None,
        }
    }

    pub fn entries(&self) -> Option<&BTreeMap<String, FileWrapper>> {
        match self {
            FileWrapper::Directory(entries) => Some(entries),
            FileWrapper::Regular(_) => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FileWrapper> {
        self.entries().and_then(|entries| entries.get(name))
    }

    /// Looks up a named package entry, descending into its parent slot first
    /// when it has one.
    pub fn slot(&self, slot: Slot) -> Option<&FileWrapper> {
        match slot.parent() {
            Some(parent) => self.slot(parent)?.get(slot.file_name()),
            None => self.get(slot.file_name()),
        }
    }

    pub fn has_slot(&self, slot: Slot) -> bool {
        self.slot(slot).is_some()
    }

    /// Inserts `wrapper` at a top-level slot, replacing whatever was there.
    pub fn insert_slot(&mut self, slot: Slot, wrapper: FileWrapper) -> Result<()> {
        if slot.parent().is_some() {
            return Err(NotesError::Store(format!(
                "slot {} is nested and cannot be inserted directly",
                slot.file_name()
            )));
        }
        match self {
            FileWrapper::Directory(entries) => {
                entries.insert(slot.file_name().to_string(), wrapper);
                Ok(())
            }
            FileWrapper::Regular(_) => Err(NotesError::CannotLoadFileWrappers),
        }
    }

    pub fn remove_slot(&mut self, slot: Slot) -> Option<FileWrapper> {
        if slot.parent().is_some() {
            return None;
        }
        match self {
            FileWrapper::Directory(entries) => entries.remove(slot.file_name()),
            FileWrapper::Regular(_) => None,
        }
    }

    /// Every regular file in the tree as `(relative path, bytes)`, in name order.
    pub fn regular_files(&self) -> Vec<(String, &[u8])> {
        let mut files = Vec::new();
        self.collect_files("", &mut files);
        files
    }

    fn collect_files<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a [u8])>) {
        match self {
            FileWrapper::Regular(bytes) => out.push((prefix.to_string(), bytes)),
            FileWrapper::Directory(entries) => {
                for (name, child) in entries {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{}/{}", prefix, name)
                    };
                    child.collect_files(&path, out);
                }
            }
        }
    }

    /// Reads a file or directory tree from disk. Symlinks are followed;
    /// entries whose names are not valid UTF-8 are rejected.
    pub fn read_from(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        if meta.is_file() {
            return Ok(FileWrapper::Regular(fs::read(path)?));
        }
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is neither a file nor a directory", path.display()),
            ));
        }

        let mut entries = BTreeMap::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().into_string().map_err(|raw| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("non UTF-8 entry name {:?}", raw),
                )
            })?;
            entries.insert(name, FileWrapper::read_from(&entry.path())?);
        }
        Ok(FileWrapper::Directory(entries))
    }

    /// Writes the tree at `path`, which must not exist yet.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        match self {
            FileWrapper::Regular(bytes) => fs::write(path, bytes),
            FileWrapper::Directory(entries) => {
                fs::create_dir(path)?;
                for (name, child) in entries {
                    child.write_to(&path.join(name))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn insert_slot_replaces_existing_entry() {
        let mut package = FileWrapper::directory();
        package
            .insert_slot(Slot::Text, FileWrapper::regular("one"))
            .unwrap();
        package
            .insert_slot(Slot::Text, FileWrapper::regular("two"))
            .unwrap();

        assert_eq!(package.entries().unwrap().len(), 1);
        assert_eq!(
            package.slot(Slot::Text).unwrap().regular_contents(),
            Some(&b"two"[..])
        );
    }

    #[test]
    fn insert_into_regular_file_fails() {
        let mut file = FileWrapper::regular("x");
        assert!(matches!(
            file.insert_slot(Slot::Text, FileWrapper::regular("y")),
            Err(NotesError::CannotLoadFileWrappers)
        ));
    }

    #[test]
    fn nested_slot_lookup_walks_parent() {
        let mut quick_look = BTreeMap::new();
        quick_look.insert("Preview.rtf".to_string(), FileWrapper::regular("p"));
        let mut package = FileWrapper::directory();
        package
            .insert_slot(Slot::QuickLook, FileWrapper::Directory(quick_look))
            .unwrap();

        assert!(package.has_slot(Slot::QuickLookPreview));
        assert!(!package.has_slot(Slot::QuickLookThumbnail));
    }

    #[test]
    fn disk_round_trip_preserves_tree() {
        let dir = TempDir::new().unwrap();
        let mut package = FileWrapper::directory();
        package
            .insert_slot(Slot::Text, FileWrapper::regular("{\\rtf1 hi}"))
            .unwrap();
        package
            .insert_slot(Slot::Attachments, FileWrapper::directory())
            .unwrap();

        let path = dir.path().join("Doc.note");
        package.write_to(&path).unwrap();
        let loaded = FileWrapper::read_from(&path).unwrap();

        assert_eq!(loaded, package);
        assert_eq!(
            loaded.regular_files(),
            vec![("Text.rtf".to_string(), &b"{\\rtf1 hi}"[..])]
        );
    }
}

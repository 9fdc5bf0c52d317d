use super::codec::{RichTextCodec, RtfCodec};
use super::document::NoteDocument;
use crate::error::{NotesError, Result};
use crate::store::StorageBackend;
use log::debug;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperation {
    /// The path must not exist yet.
    ForCreating,
    ForOverwriting,
}

/// Opens and saves note documents through a storage backend.
pub struct DocumentHost<B, C = RtfCodec> {
    backend: Arc<B>,
    codec: C,
}

impl<B, C: Clone> Clone for DocumentHost<B, C> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            codec: self.codec.clone(),
        }
    }
}

impl<B: StorageBackend> DocumentHost<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_codec(backend, RtfCodec)
    }
}

impl<B: StorageBackend, C: RichTextCodec> DocumentHost<B, C> {
    pub fn with_codec(backend: Arc<B>, codec: C) -> Self {
        Self { backend, codec }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn open(&self, path: &Path) -> Result<NoteDocument> {
        let package = self.backend.read_package(path)?;
        let document = NoteDocument::load(package, &self.codec)?;
        debug!("Opened {}", path.display());
        Ok(document)
    }

    pub fn save(&self, path: &Path, document: &mut NoteDocument, op: SaveOperation) -> Result<()> {
        if op == SaveOperation::ForCreating && self.backend.exists(path) {
            return Err(NotesError::Store(format!(
                "{} already exists",
                path.display()
            )));
        }
        let package = document.contents(&self.codec)?;
        self.backend.write_package(path, &package)?;
        document.mark_saved();
        debug!("Saved {} ({:?})", path.display(), op);
        Ok(())
    }

    /// Persists a new, empty note at `path`.
    pub fn create(&self, path: &Path) -> Result<NoteDocument> {
        let mut document = NoteDocument::new();
        self.save(path, &mut document, SaveOperation::ForCreating)?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyledText;
    use crate::package::Slot;
    use crate::store::MemBackend;

    #[test]
    fn create_then_open_yields_empty_note() {
        let backend = Arc::new(MemBackend::new());
        let host = DocumentHost::new(Arc::clone(&backend));
        let path = backend.local_path("Document 1.note");

        host.create(&path).unwrap();
        let doc = host.open(&path).unwrap();

        assert!(doc.text().is_empty());
        assert!(doc.package().has_slot(Slot::Text));
        assert!(!doc.package().has_slot(Slot::Location));
    }

    #[test]
    fn create_refuses_existing_path() {
        let backend = Arc::new(MemBackend::new());
        let host = DocumentHost::new(Arc::clone(&backend));
        let path = backend.local_path("taken.note");
        host.create(&path).unwrap();

        assert!(matches!(host.create(&path), Err(NotesError::Store(_))));
    }

    #[test]
    fn overwrite_clears_unsaved_changes() {
        let backend = Arc::new(MemBackend::new());
        let host = DocumentHost::new(Arc::clone(&backend));
        let path = backend.local_path("edit.note");
        let mut doc = host.create(&path).unwrap();

        doc.set_text(StyledText::plain("changed"));
        assert!(doc.has_unsaved_changes());
        host.save(&path, &mut doc, SaveOperation::ForOverwriting)
            .unwrap();

        assert!(!doc.has_unsaved_changes());
        assert_eq!(host.open(&path).unwrap().text().text(), "changed");
    }

    #[test]
    fn open_missing_package_fails_with_access_error() {
        let backend = Arc::new(MemBackend::new());
        let host = DocumentHost::new(Arc::clone(&backend));
        assert!(matches!(
            host.open(&backend.local_path("nope.note")),
            Err(NotesError::CannotAccessDocument(_))
        ));
    }

    #[test]
    fn failed_write_keeps_document_dirty() {
        let backend = Arc::new(MemBackend::new());
        let host = DocumentHost::new(Arc::clone(&backend));
        let path = backend.local_path("x.note");
        let mut doc = host.create(&path).unwrap();
        doc.set_text(StyledText::plain("pending"));

        backend.set_simulate_write_error(true);
        assert!(host
            .save(&path, &mut doc, SaveOperation::ForOverwriting)
            .is_err());
        assert!(doc.has_unsaved_changes());
    }
}

use super::codec::RichTextCodec;
use super::wrapper::FileWrapper;
use super::Slot;
use crate::error::{NotesError, Result};
use crate::model::{Location, StyledText};

/// A note's in-memory state and its mapping to a package.
///
/// The retained package is updated incrementally on save: only the text entry
/// is rewritten, and a location entry is added the first time one is held.
/// A location already stored in the package is never replaced.
#[derive(Debug, Clone, Default)]
pub struct NoteDocument {
    text: StyledText,
    location: Option<FileWrapper>,
    package: FileWrapper,
    change_count: usize,
}

impl NoteDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from a package read off storage.
    ///
    /// # Errors
    /// - `CannotLoadFileWrappers` when `contents` is not a directory.
    /// - `CannotLoadText` when the text entry is missing, is not a regular
    ///   file, or does not decode.
    pub fn load<C: RichTextCodec + ?Sized>(contents: FileWrapper, codec: &C) -> Result<Self> {
        if !contents.is_directory() {
            return Err(NotesError::CannotLoadFileWrappers);
        }

        let bytes = contents
            .slot(Slot::Text)
            .and_then(FileWrapper::regular_contents)
            .ok_or_else(|| {
                NotesError::CannotLoadText(format!(
                    "package has no readable {} entry",
                    Slot::Text.file_name()
                ))
            })?;
        let text = codec.decode(bytes)?;
        let location = contents.slot(Slot::Location).cloned();

        Ok(Self {
            text,
            location,
            package: contents,
            change_count: 0,
        })
    }

    /// Produces the package to persist.
    ///
    /// # Errors
    /// `CannotSaveText` when the text cannot be encoded; the retained package
    /// is left untouched in that case.
    pub fn contents<C: RichTextCodec + ?Sized>(&mut self, codec: &C) -> Result<FileWrapper> {
        let encoded = codec.encode(&self.text)?;

        self.package.remove_slot(Slot::Text);
        if !self.package.has_slot(Slot::Location) {
            if let Some(location) = &self.location {
                self.package.insert_slot(Slot::Location, location.clone())?;
            }
        }
        self.package
            .insert_slot(Slot::Text, FileWrapper::regular(encoded))?;

        Ok(self.package.clone())
    }

    pub fn text(&self) -> &StyledText {
        &self.text
    }

    pub fn set_text(&mut self, text: StyledText) {
        self.text = text;
        self.change_count += 1;
    }

    /// Holds `location` as the attachment to write on the next save.
    pub fn set_location(&mut self, location: &Location) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(location)
            .map_err(|e| NotesError::CannotSaveAttachment(e.to_string()))?;
        self.location = Some(FileWrapper::regular(bytes));
        self.change_count += 1;
        Ok(())
    }

    pub fn location_attachment(&self) -> Option<&FileWrapper> {
        self.location.as_ref()
    }

    /// Parses the held location attachment.
    pub fn location(&self) -> Result<Option<Location>> {
        let Some(wrapper) = &self.location else {
            return Ok(None);
        };
        let bytes = wrapper.regular_contents().ok_or_else(|| {
            NotesError::CannotAccessAttachments(format!(
                "{} is not a regular file",
                Slot::Location.file_name()
            ))
        })?;
        serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|e| NotesError::CannotAccessAttachments(e.to_string()))
    }

    /// Whether the retained package already carries a location entry.
    pub fn has_stored_location(&self) -> bool {
        self.package.has_slot(Slot::Location)
    }

    pub fn package(&self) -> &FileWrapper {
        &self.package
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.change_count > 0
    }

    pub(crate) fn mark_saved(&mut self) {
        self.change_count = 0;
    }
}

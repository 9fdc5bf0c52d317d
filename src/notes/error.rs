use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while reading, writing or cataloguing notes.
///
/// The first six variants mirror the failure points of the package codec and
/// are surfaced to whoever opened or saved the document. The rest come from the
/// storage layer and the command surface.
#[derive(Error, Debug)]
pub enum NotesError {
    /// The package could not be found at all.
    #[error("Cannot access document at {}", .0.display())]
    CannotAccessDocument(PathBuf),

    /// The package is not a directory of entries.
    #[error("Cannot load package entries")]
    CannotLoadFileWrappers,

    /// The text entry is missing, not a regular file, or not valid rich text.
    #[error("Cannot load text: {0}")]
    CannotLoadText(String),

    /// An attachment entry exists but could not be read.
    #[error("Cannot access attachments: {0}")]
    CannotAccessAttachments(String),

    /// The styled text could not be encoded.
    #[error("Cannot save text: {0}")]
    CannotSaveText(String),

    /// An attachment could not be encoded.
    #[error("Cannot save attachment: {0}")]
    CannotSaveAttachment(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Not supported: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, NotesError>;

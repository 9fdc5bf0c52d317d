//! # Note Packages
//!
//! A note is stored as a *package*: a directory that the user sees as a single
//! document. The package is the only durable form of a note; there is no
//! separate index.
//!
//! ## Package Layout
//!
//! ```text
//! Document 1234.note/
//! ├── Text.rtf            # Styled text (required)
//! ├── Attachments/        # Auxiliary files (declared, unused)
//! ├── location.json       # Optional place data, kept verbatim
//! └── QuickLook/          # Reserved for previews, never written here
//!     ├── Preview.rtf
//!     └── Thumbnail.png
//! ```
//!
//! Entry names are a compatibility contract and are case-sensitive. Code
//! never spells them out; it goes through [`Slot`].
//!
//! ## Layers
//!
//! - [`wrapper::FileWrapper`]: the in-memory tree of a package.
//! - [`codec`]: styled text <-> RTF bytes.
//! - [`document::NoteDocument`]: a note's state plus the load/save mapping.
//! - [`host::DocumentHost`]: open/save/create through a storage backend.

pub mod codec;
pub mod document;
pub mod host;
pub mod wrapper;

pub use codec::{RichTextCodec, RtfCodec};
pub use document::NoteDocument;
pub use host::{DocumentHost, SaveOperation};
pub use wrapper::FileWrapper;

/// File extension shared by every note package.
pub const NOTE_EXTENSION: &str = "note";

/// Named entries of a note package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Text,
    Attachments,
    QuickLook,
    QuickLookPreview,
    QuickLookThumbnail,
    Location,
}

impl Slot {
    /// On-disk entry name.
    pub fn file_name(self) -> &'static str {
        match self {
            Slot::Text => "Text.rtf",
            Slot::Attachments => "Attachments",
            Slot::QuickLook => "QuickLook",
            Slot::QuickLookPreview => "Preview.rtf",
            Slot::QuickLookThumbnail => "Thumbnail.png",
            Slot::Location => "location.json",
        }
    }

    /// The directory slot this entry lives under, if any.
    pub fn parent(self) -> Option<Slot> {
        match self {
            Slot::QuickLookPreview | Slot::QuickLookThumbnail => Some(Slot::QuickLook),
            _ => None,
        }
    }
}

/// Whether `path` names a note package by extension.
pub fn has_note_extension(path: &std::path::Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(NOTE_EXTENSION)
}

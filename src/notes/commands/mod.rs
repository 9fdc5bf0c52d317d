use crate::catalog::CatalogEntry;
use crate::config::NotesConfig;
use crate::error::{NotesError, Result};
use crate::model::{Location, StyledText};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub mod config;
pub mod create;
pub mod export;
pub mod helpers;
pub mod list;
pub mod locate;
pub mod paths;
pub mod show;
pub mod write;

/// Directories the command surface works with.
#[derive(Debug, Clone)]
pub struct NotesPaths {
    /// Holds `config.json` and `settings.json`.
    pub config_dir: PathBuf,
    pub local_dir: PathBuf,
    pub cloud_dir: Option<PathBuf>,
}

/// Picks a note out of the catalog: a 1-based list index or a file name,
/// with or without the `.note` extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteSelector {
    Index(usize),
    Name(String),
}

impl FromStr for NoteSelector {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NotesError::Api("Empty note selector".to_string()));
        }
        match s.parse::<usize>() {
            Ok(0) => Err(NotesError::Api("Note indexes start at 1".to_string())),
            Ok(n) => Ok(NoteSelector::Index(n)),
            Err(_) => Ok(NoteSelector::Name(s.to_string())),
        }
    }
}

impl fmt::Display for NoteSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteSelector::Index(n) => write!(f, "{}", n),
            NoteSelector::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A catalog entry with its position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNote {
    pub index: usize,
    pub entry: CatalogEntry,
}

/// An opened note, ready to print.
#[derive(Debug, Clone)]
pub struct NoteView {
    pub index: usize,
    pub name: String,
    pub text: StyledText,
    pub location: Option<Location>,
}

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub listed_notes: Vec<DisplayNote>,
    pub shown_notes: Vec<NoteView>,
    pub note_paths: Vec<PathBuf>,
    pub config: Option<NotesConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_listed_notes(mut self, notes: Vec<DisplayNote>) -> Self {
        self.listed_notes = notes;
        self
    }

    pub fn with_shown_notes(mut self, notes: Vec<NoteView>) -> Self {
        self.shown_notes = notes;
        self
    }

    pub fn with_note_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.note_paths = paths;
        self
    }

    pub fn with_config(mut self, config: NotesConfig) -> Self {
        self.config = Some(config);
        self
    }
}

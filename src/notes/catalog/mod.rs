//! # Catalog
//!
//! The catalog is the list of notes the user can see. It is assembled from two
//! sources:
//!
//! 1. A scan of the local notes directory.
//! 2. A live search of the cloud directory, when syncing is on.
//!
//! Each entry is classified as openable or not. With syncing on, anything
//! found locally is moved into the cloud directory and anything in the cloud
//! that is not yet on disk gets a download request.
//!
//! ## Ownership
//!
//! One task owns the catalog ([`actor::Catalog`]). Everything else talks to
//! it through a [`CatalogHandle`]: commands go in over one inbox and are
//! handled in order, changes come out on a [`CatalogUpdate`] stream. Slow
//! storage work (moves into the cloud directory, download requests) runs on
//! the blocking pool and is handed back to the owner as a message, so the
//! catalog is never shared and needs no lock.
//!
//! ## First Run
//!
//! Until the user has picked a mode, [`CatalogHandle::start`] only emits
//! [`CatalogUpdate::PromptForMode`]. The answer is given with
//! [`CatalogHandle::choose_mode`] and persisted in the settings store.

pub mod actor;

pub use actor::Catalog;

use crate::error::{NotesError, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// Where notes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Cloud,
    Local,
}

/// One visible note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub location: PathBuf,
    pub display_name: String,
    pub openable: bool,
    pub modified: Option<DateTime<Utc>>,
}

/// Why the catalog was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    Started,
    LocalScan,
    QueryGathered,
    QueryUpdated,
    NoteCreated,
    /// A local note finished moving into the cloud directory.
    NoteMoved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogUpdate {
    /// Settings say the user was never asked where to keep notes.
    PromptForMode,
    Reloaded {
        reason: ReloadReason,
        entries: Vec<CatalogEntry>,
    },
}

pub(crate) enum Command {
    Start(oneshot::Sender<Result<Option<SyncMode>>>),
    ChooseMode(SyncMode, oneshot::Sender<Result<SyncMode>>),
    CreateNote(oneshot::Sender<Result<PathBuf>>),
    Snapshot(oneshot::Sender<Vec<CatalogEntry>>),
    Settle(oneshot::Sender<()>),
    Delete(PathBuf, oneshot::Sender<Result<()>>),
    Rename(PathBuf, String, oneshot::Sender<Result<()>>),
    Shutdown(oneshot::Sender<()>),
}

/// Cheap, cloneable access to a running catalog.
#[derive(Clone)]
pub struct CatalogHandle {
    tx: mpsc::UnboundedSender<Command>,
}

fn closed() -> NotesError {
    NotesError::Api("catalog has shut down".to_string())
}

impl CatalogHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx.send(command(reply)).map_err(|_| closed())?;
        response.await.map_err(|_| closed())
    }

    /// Reads settings and either asks for a mode or starts cataloguing.
    ///
    /// Returns the mode in effect, or `None` after emitting
    /// [`CatalogUpdate::PromptForMode`].
    pub async fn start(&self) -> Result<Option<SyncMode>> {
        self.request(Command::Start).await?
    }

    /// Persists the user's answer. The returned mode is the one in effect,
    /// which is `Local` when no cloud directory is available.
    pub async fn choose_mode(&self, mode: SyncMode) -> Result<SyncMode> {
        self.request(|reply| Command::ChooseMode(mode, reply)).await?
    }

    /// Creates an empty note and returns where it ended up.
    pub async fn create_note(&self) -> Result<PathBuf> {
        self.request(Command::CreateNote).await?
    }

    pub async fn snapshot(&self) -> Result<Vec<CatalogEntry>> {
        self.request(Command::Snapshot).await
    }

    /// Waits until every background move and download request has finished
    /// and been applied.
    pub async fn settle(&self) -> Result<()> {
        self.request(Command::Settle).await
    }

    pub async fn delete_note(&self, location: PathBuf) -> Result<()> {
        self.request(|reply| Command::Delete(location, reply)).await?
    }

    pub async fn rename_note(&self, location: PathBuf, new_name: String) -> Result<()> {
        self.request(|reply| Command::Rename(location, new_name, reply))
            .await?
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await
    }
}

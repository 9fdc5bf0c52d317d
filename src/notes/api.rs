//! # API Facade
//!
//! A thin layer over the catalog and the command modules, and the single
//! entry point for any client. It:
//!
//! - Starts and talks to the catalog task
//! - Parses selectors
//! - Dispatches to `commands/*.rs` with a catalog snapshot
//! - Returns `Result<CmdResult>`, never prints
//!
//! `NotesApi<B>` is generic over the storage backend: `FsBackend` in the
//! binary, `MemBackend` in tests.

use crate::catalog::{Catalog, CatalogHandle, CatalogUpdate, ReloadReason, SyncMode};
use crate::commands::{self, NoteSelector, NotesPaths};
use crate::error::{NotesError, Result};
use crate::model::Location;
use crate::package::DocumentHost;
use crate::settings::SettingsStore;
use crate::store::{MetadataQuery, StorageBackend};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const DEFAULT_SYNC_WAIT: Duration = Duration::from_secs(5);

pub struct NotesApi<B: StorageBackend> {
    catalog: CatalogHandle,
    updates: UnboundedReceiver<CatalogUpdate>,
    host: DocumentHost<B>,
    paths: NotesPaths,
    sync_wait: Duration,
}

impl<B: StorageBackend> NotesApi<B> {
    /// Spawns the catalog on the current runtime.
    pub fn open<Q, S>(backend: Arc<B>, query: Q, settings: S, paths: NotesPaths) -> Self
    where
        Q: MetadataQuery,
        S: SettingsStore,
    {
        let (catalog, updates) = Catalog::spawn(Arc::clone(&backend), query, settings);
        Self {
            catalog,
            updates,
            host: DocumentHost::new(backend),
            paths,
            sync_wait: DEFAULT_SYNC_WAIT,
        }
    }

    /// How long [`NotesApi::sync`] waits for the first cloud search results.
    pub fn with_sync_wait(mut self, wait: Duration) -> Self {
        self.sync_wait = wait;
        self
    }

    /// `None` means the user has to pick a mode first.
    pub async fn start(&self) -> Result<Option<SyncMode>> {
        self.catalog.start().await
    }

    pub async fn choose_mode(&self, mode: SyncMode) -> Result<SyncMode> {
        self.catalog.choose_mode(mode).await
    }

    /// Brings the catalog to a stable state: in cloud mode waits for search
    /// results, then lets background work finish.
    pub async fn sync(&mut self, mode: SyncMode) -> Result<()> {
        if mode == SyncMode::Cloud {
            let deadline = tokio::time::Instant::now() + self.sync_wait;
            loop {
                match tokio::time::timeout_at(deadline, self.updates.recv()).await {
                    Ok(Some(CatalogUpdate::Reloaded {
                        reason: ReloadReason::QueryGathered | ReloadReason::QueryUpdated,
                        entries,
                    })) => {
                        debug!("Cloud search returned {} entries", entries.len());
                        break;
                    }
                    Ok(Some(_)) => continue,
                    Ok(None) => return Err(NotesError::Api("catalog has shut down".to_string())),
                    Err(_) => {
                        warn!("Timed out waiting for cloud search results");
                        break;
                    }
                }
            }
        }
        self.catalog.settle().await
    }

    /// Catalog changes, for clients that render live.
    pub fn updates(&mut self) -> &mut UnboundedReceiver<CatalogUpdate> {
        &mut self.updates
    }

    pub async fn list_notes(&self) -> Result<commands::CmdResult> {
        let entries = self.catalog.snapshot().await?;
        commands::list::run(&entries)
    }

    pub async fn create_note(&self, markdown: Option<&str>) -> Result<commands::CmdResult> {
        let path = self.catalog.create_note().await?;
        commands::create::run(&self.host, path, markdown)
    }

    pub async fn show_notes<I: AsRef<str>>(&self, selectors: &[I]) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        let entries = self.catalog.snapshot().await?;
        commands::show::run(&self.host, &entries, &selectors)
    }

    pub async fn write_note(&self, selector: &str, markdown: &str) -> Result<commands::CmdResult> {
        let selector: NoteSelector = selector.parse()?;
        let entries = self.catalog.snapshot().await?;
        commands::write::run(&self.host, &entries, &selector, markdown)
    }

    pub async fn locate_note(
        &self,
        selector: &str,
        location: &Location,
    ) -> Result<commands::CmdResult> {
        let selector: NoteSelector = selector.parse()?;
        let entries = self.catalog.snapshot().await?;
        commands::locate::run(&self.host, &entries, &selector, location)
    }

    pub async fn export_notes<I: AsRef<str>>(
        &self,
        selectors: &[I],
        output: Option<PathBuf>,
    ) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        let entries = self.catalog.snapshot().await?;
        commands::export::run(&self.host, &entries, &selectors, output)
    }

    pub async fn note_paths<I: AsRef<str>>(&self, selectors: &[I]) -> Result<commands::CmdResult> {
        let selectors = parse_selectors(selectors)?;
        let entries = self.catalog.snapshot().await?;
        commands::paths::run(&entries, &selectors)
    }

    pub async fn delete_note(&self, selector: &str) -> Result<commands::CmdResult> {
        let location = self.resolve_one(selector).await?;
        self.catalog.delete_note(location).await?;
        Ok(commands::CmdResult::default())
    }

    pub async fn rename_note(&self, selector: &str, new_name: &str) -> Result<commands::CmdResult> {
        let location = self.resolve_one(selector).await?;
        self.catalog
            .rename_note(location, new_name.to_string())
            .await?;
        Ok(commands::CmdResult::default())
    }

    pub fn config(&self, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&self.paths, action)
    }

    pub fn paths(&self) -> &NotesPaths {
        &self.paths
    }

    pub async fn shutdown(self) -> Result<()> {
        self.catalog.shutdown().await
    }

    async fn resolve_one(&self, selector: &str) -> Result<PathBuf> {
        let selector: NoteSelector = selector.parse()?;
        let entries = self.catalog.snapshot().await?;
        let result = commands::paths::run(&entries, std::slice::from_ref(&selector))?;
        result
            .note_paths
            .into_iter()
            .next()
            .ok_or_else(|| NotesError::NoteNotFound(selector.to_string()))
    }
}

fn parse_selectors<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<NoteSelector>> {
    inputs.iter().map(|s| s.as_ref().parse()).collect()
}

pub use crate::commands::config::ConfigAction;
pub use commands::{CmdMessage, CmdResult, DisplayNote, MessageLevel, NoteView};

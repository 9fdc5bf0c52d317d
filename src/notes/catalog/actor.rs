use super::{CatalogEntry, CatalogHandle, CatalogUpdate, Command, ReloadReason, SyncMode};
use crate::error::{NotesError, Result};
use crate::package::{has_note_extension, DocumentHost, NOTE_EXTENSION};
use crate::settings::{Settings, SettingsStore};
use crate::store::{DownloadStatus, MetadataQuery, QueryEvent, StorageBackend};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinSet};
use uuid::Uuid;

/// Results of blocking storage work, applied back on the catalog task.
enum TaskOutcome {
    Download {
        location: PathBuf,
        result: Result<()>,
    },
    /// A move into the cloud directory. `reply` is set for newly created
    /// notes.
    Migration {
        source: PathBuf,
        destination: PathBuf,
        result: Result<()>,
        reply: Option<oneshot::Sender<Result<PathBuf>>>,
    },
}

/// The task that owns the catalog.
pub struct Catalog<B, Q, S> {
    backend: Arc<B>,
    host: DocumentHost<B>,
    query: Q,
    settings: S,
    use_cloud: bool,
    locations: Vec<PathBuf>,
    modified_hints: HashMap<PathBuf, DateTime<Utc>>,
    /// Sources of moves still running on the blocking pool.
    migrating: HashSet<PathBuf>,
    query_events: Option<UnboundedReceiver<QueryEvent>>,
    tasks: JoinSet<TaskOutcome>,
    updates: UnboundedSender<CatalogUpdate>,
}

impl<B, Q, S> Catalog<B, Q, S>
where
    B: StorageBackend,
    Q: MetadataQuery,
    S: SettingsStore,
{
    /// Spawns the catalog on the current runtime.
    pub fn spawn(
        backend: Arc<B>,
        query: Q,
        settings: S,
    ) -> (CatalogHandle, UnboundedReceiver<CatalogUpdate>) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let catalog = Catalog {
            host: DocumentHost::new(Arc::clone(&backend)),
            backend,
            query,
            settings,
            use_cloud: false,
            locations: Vec::new(),
            modified_hints: HashMap::new(),
            migrating: HashSet::new(),
            query_events: None,
            tasks: JoinSet::new(),
            updates,
        };
        tokio::spawn(catalog.run(inbox));
        (CatalogHandle::new(tx), updates_rx)
    }

    async fn run(mut self, mut inbox: UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = inbox.recv() => match command {
                    Some(command) => {
                        if !self.handle(command).await {
                            break;
                        }
                    }
                    None => {
                        self.finish().await;
                        break;
                    }
                },
                event = next_event(&mut self.query_events) => match event {
                    Some(event) => self.query_updated(event),
                    None => self.query_events = None,
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.apply(joined);
                }
            }
        }
        debug!("Catalog stopped");
    }

    /// Returns false once the catalog has shut down.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.start());
            }
            Command::ChooseMode(mode, reply) => {
                let _ = reply.send(self.choose_mode(mode));
            }
            Command::CreateNote(reply) => self.create_note(reply),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Settle(reply) => {
                self.settle().await;
                let _ = reply.send(());
            }
            Command::Delete(location, reply) => {
                debug!("Delete requested for {}", location.display());
                let _ = reply.send(Err(NotesError::Unsupported("deleting notes")));
            }
            Command::Rename(location, new_name, reply) => {
                debug!("Rename of {} to {} requested", location.display(), new_name);
                let _ = reply.send(Err(NotesError::Unsupported("renaming notes")));
            }
            Command::Shutdown(reply) => {
                self.finish().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn start(&mut self) -> Result<Option<SyncMode>> {
        let settings = self.settings.load()?;
        if !settings.has_prompted {
            debug!("No storage mode chosen yet");
            self.emit(CatalogUpdate::PromptForMode);
            return Ok(None);
        }

        self.use_cloud = self.cloud_is_effective(settings.use_cloud);
        if self.use_cloud {
            self.start_query()?;
        } else {
            self.stop_query();
        }
        self.locations = self.refresh_local_files();
        self.emit_reloaded(ReloadReason::Started);
        Ok(Some(self.mode()))
    }

    fn mode(&self) -> SyncMode {
        if self.use_cloud {
            SyncMode::Cloud
        } else {
            SyncMode::Local
        }
    }

    fn choose_mode(&mut self, mode: SyncMode) -> Result<SyncMode> {
        let use_cloud = mode == SyncMode::Cloud;
        self.settings.save(&Settings {
            use_cloud,
            has_prompted: true,
        })?;

        self.use_cloud = self.cloud_is_effective(use_cloud);
        if self.use_cloud {
            self.start_query()?;
        } else {
            self.stop_query();
            self.locations = self.refresh_local_files();
            self.emit_reloaded(ReloadReason::LocalScan);
        }
        Ok(self.mode())
    }

    fn cloud_is_effective(&self, wanted: bool) -> bool {
        if wanted && self.backend.cloud_documents_dir().is_none() {
            warn!("Cloud storage requested but no cloud directory is available");
        }
        wanted && self.backend.cloud_documents_dir().is_some()
    }

    fn start_query(&mut self) -> Result<()> {
        if self.query.is_running() {
            return Ok(());
        }
        let (sink, events) = mpsc::unbounded_channel();
        self.query.start(sink)?;
        self.query_events = Some(events);
        debug!("Cloud search started");
        Ok(())
    }

    fn stop_query(&mut self) {
        if self.query.is_running() {
            self.query.stop();
            debug!("Cloud search stopped");
        }
        self.query_events = None;
    }

    /// Scans the local directory and returns the notes found there. With
    /// cloud on, each one not already on its way is moved in the background.
    fn refresh_local_files(&mut self) -> Vec<PathBuf> {
        let local_dir = self.backend.local_documents_dir().to_path_buf();
        let notes: Vec<PathBuf> = match self.backend.list_directory(&local_dir) {
            Ok(paths) => paths.into_iter().filter(|p| has_note_extension(p)).collect(),
            Err(e) => {
                warn!("Failed to scan {}: {}", local_dir.display(), e);
                return Vec::new();
            }
        };
        debug!("Local scan found {} notes", notes.len());

        if self.use_cloud {
            if let Some(cloud_dir) = self.backend.cloud_documents_dir().map(Path::to_path_buf) {
                for item in &notes {
                    if self.migrating.contains(item) {
                        continue;
                    }
                    if let Some(name) = item.file_name() {
                        self.migrate(item.clone(), cloud_dir.join(name), None);
                    }
                }
            }
        }
        notes
    }

    fn migrate(
        &mut self,
        source: PathBuf,
        destination: PathBuf,
        reply: Option<oneshot::Sender<Result<PathBuf>>>,
    ) {
        self.migrating.insert(source.clone());
        let backend = Arc::clone(&self.backend);
        self.tasks.spawn_blocking(move || {
            let result = backend.set_ubiquitous(&source, &destination);
            TaskOutcome::Migration {
                source,
                destination,
                result,
                reply,
            }
        });
    }

    fn query_updated(&mut self, event: QueryEvent) {
        if !self.use_cloud {
            debug!("Ignoring search results while cloud is off");
            return;
        }
        let reason = match event {
            QueryEvent::FinishedGathering(_) => ReloadReason::QueryGathered,
            QueryEvent::Updated(_) => ReloadReason::QueryUpdated,
        };

        self.modified_hints.clear();
        self.locations = self.refresh_local_files();

        for item in event.items() {
            let Some(location) = item.location.clone() else {
                debug!("Skipping unresolvable search result {}", item.name);
                continue;
            };
            if let Some(modified) = item.modified {
                self.modified_hints.insert(location.clone(), modified);
            }
            if !self.item_is_openable(&location) {
                self.request_download(location.clone());
            }
            self.locations.push(location);
        }
        debug!("Search cycle produced {} entries", self.locations.len());
        self.emit_reloaded(reason);
    }

    fn item_is_openable(&self, location: &Path) -> bool {
        if !self.use_cloud {
            return true;
        }
        match self.backend.download_status(location) {
            Ok(DownloadStatus::Current) => true,
            Ok(_) => false,
            Err(e) => {
                warn!("Failed to get download status of {}: {}", location.display(), e);
                false
            }
        }
    }

    fn request_download(&mut self, location: PathBuf) {
        let backend = Arc::clone(&self.backend);
        self.tasks.spawn_blocking(move || {
            let result = backend.start_downloading(&location);
            TaskOutcome::Download { location, result }
        });
    }

    fn unused_note_path(&self) -> PathBuf {
        let local_dir = self.backend.local_documents_dir();
        let cloud_dir = self.backend.cloud_documents_dir();
        loop {
            let number = Uuid::new_v4().as_u128() as u32;
            let name = format!("Document {}.{}", number, NOTE_EXTENSION);
            let taken = self.backend.exists(&local_dir.join(&name))
                || cloud_dir
                    .map(|dir| self.backend.exists(&dir.join(&name)))
                    .unwrap_or(false);
            if !taken {
                return local_dir.join(name);
            }
        }
    }

    fn create_note(&mut self, reply: oneshot::Sender<Result<PathBuf>>) {
        let path = self.unused_note_path();
        if let Err(e) = self.host.create(&path) {
            let _ = reply.send(Err(e));
            return;
        }

        let cloud_dir = self
            .backend
            .cloud_documents_dir()
            .filter(|_| self.use_cloud)
            .map(Path::to_path_buf);
        match (cloud_dir, path.file_name()) {
            (Some(dir), Some(name)) => {
                let destination = dir.join(name);
                self.migrate(path.clone(), destination, Some(reply));
            }
            _ => {
                self.locations.push(path.clone());
                self.emit_reloaded(ReloadReason::NoteCreated);
                let _ = reply.send(Ok(path));
            }
        }
    }

    fn apply(&mut self, joined: std::result::Result<TaskOutcome, JoinError>) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Background storage task failed: {}", e);
                return;
            }
        };
        match outcome {
            TaskOutcome::Download { location, result } => match result {
                Ok(()) => debug!("Requested download of {}", location.display()),
                Err(e) => warn!("Failed to download {}: {}", location.display(), e),
            },
            TaskOutcome::Migration {
                source,
                destination,
                result,
                reply,
            } => {
                self.migrating.remove(&source);
                match result {
                    Ok(()) => {
                        debug!("Moved {} to {}", source.display(), destination.display());
                        self.moved(&source, &destination);
                        let reason = if reply.is_some() {
                            ReloadReason::NoteCreated
                        } else {
                            ReloadReason::NoteMoved
                        };
                        self.emit_reloaded(reason);
                        if let Some(reply) = reply {
                            let _ = reply.send(Ok(destination));
                        }
                    }
                    Err(e) => {
                        warn!("Failed to move {} to the cloud: {}", source.display(), e);
                        if let Some(reply) = reply {
                            let landed = if self.backend.exists(&destination) {
                                destination
                            } else {
                                source
                            };
                            let _ = reply.send(Ok(landed));
                        }
                    }
                }
            }
        }
    }

    /// Points the catalog at a moved note. The search may have reported the
    /// destination already.
    fn moved(&mut self, source: &Path, destination: &Path) {
        let listed = self.locations.iter().any(|l| l == destination);
        match self.locations.iter().position(|l| l == source) {
            Some(i) if listed || !self.use_cloud => {
                self.locations.remove(i);
            }
            Some(i) => self.locations[i] = destination.to_path_buf(),
            None if !listed && self.use_cloud => self.locations.push(destination.to_path_buf()),
            None => {}
        }
    }

    async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            self.apply(joined);
        }
    }

    async fn finish(&mut self) {
        self.settle().await;
        self.stop_query();
    }

    fn snapshot(&self) -> Vec<CatalogEntry> {
        self.locations
            .iter()
            .map(|location| CatalogEntry {
                display_name: location
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                openable: self.item_is_openable(location),
                modified: self
                    .backend
                    .modified(location)
                    .or_else(|| self.modified_hints.get(location).copied()),
                location: location.clone(),
            })
            .collect()
    }

    fn emit(&self, update: CatalogUpdate) {
        let _ = self.updates.send(update);
    }

    fn emit_reloaded(&self, reason: ReloadReason) {
        self.emit(CatalogUpdate::Reloaded {
            reason,
            entries: self.snapshot(),
        });
    }
}

async fn next_event(events: &mut Option<UnboundedReceiver<QueryEvent>>) -> Option<QueryEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

//! Remote search over the cloud directory.
//!
//! A query is started with a sink and reports its results as a whole: once
//! with [`QueryEvent::FinishedGathering`] after the initial scan, then with
//! [`QueryEvent::Updated`] whenever the result set changes. Consumers treat
//! both the same way and rebuild their view from the full list.

use super::fs_backend::FsBackend;
use crate::error::{NotesError, Result};
use crate::package::has_note_extension;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryItem {
    /// File name as reported by the search.
    pub name: String,
    /// Where the item can be opened from, `None` when it cannot be resolved.
    pub location: Option<PathBuf>,
    pub modified: Option<DateTime<Utc>>,
}

impl QueryItem {
    pub fn at(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let name = location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            location: Some(location),
            modified: None,
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            modified: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    FinishedGathering(Vec<QueryItem>),
    Updated(Vec<QueryItem>),
}

impl QueryEvent {
    pub fn items(&self) -> &[QueryItem] {
        match self {
            QueryEvent::FinishedGathering(items) | QueryEvent::Updated(items) => items,
        }
    }
}

/// A live search for note packages in the cloud directory.
pub trait MetadataQuery: Send + 'static {
    /// Starts delivering events to `sink`. Starting a running query is a no-op.
    fn start(&mut self, sink: UnboundedSender<QueryEvent>) -> Result<()>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Polls a directory and reports `*.note` entries, including placeholders of
/// items that are not downloaded yet.
pub struct DirectoryQuery {
    scope: Option<PathBuf>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl DirectoryQuery {
    pub fn new(scope: Option<PathBuf>, interval: Duration) -> Self {
        Self {
            scope,
            interval,
            task: None,
        }
    }

    /// Scans `scope` once. Results are sorted newest first.
    pub fn gather(scope: &Path) -> Vec<QueryItem> {
        let entries = match fs::read_dir(scope) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to search {}: {}", scope.display(), e);
                return Vec::new();
            }
        };

        let mut materialized = Vec::new();
        let mut placeholders = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);

            if has_note_extension(&path) {
                // A name that is not valid UTF-8 cannot be handed on as a path.
                let mut item = if path.file_name().and_then(|n| n.to_str()).is_some() {
                    QueryItem::at(&path)
                } else {
                    QueryItem::unresolved(entry.file_name().to_string_lossy().into_owned())
                };
                item.modified = modified;
                materialized.push(item);
            } else if let Some(target) = FsBackend::resolve_placeholder(&path) {
                if has_note_extension(&target) {
                    let mut item = QueryItem::at(target);
                    item.modified = modified;
                    placeholders.push(item);
                }
            }
        }

        // A placeholder beside its package only signals a pending update.
        let seen: HashSet<PathBuf> = materialized
            .iter()
            .filter_map(|item| item.location.clone())
            .collect();
        placeholders.retain(|item| {
            item.location
                .as_ref()
                .map(|l| !seen.contains(l))
                .unwrap_or(true)
        });

        let mut items = materialized;
        items.extend(placeholders);
        items.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        items
    }
}

impl MetadataQuery for DirectoryQuery {
    fn start(&mut self, sink: UnboundedSender<QueryEvent>) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let scope = self
            .scope
            .clone()
            .ok_or_else(|| NotesError::Store("no cloud directory to search".to_string()))?;
        let period = self.interval.max(Duration::from_millis(10));

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut last: Option<Vec<QueryItem>> = None;
            loop {
                ticker.tick().await;
                let dir = scope.clone();
                let items = match tokio::task::spawn_blocking(move || DirectoryQuery::gather(&dir))
                    .await
                {
                    Ok(items) => items,
                    Err(e) => {
                        warn!("Directory search task failed: {}", e);
                        continue;
                    }
                };
                let event = match &last {
                    None => QueryEvent::FinishedGathering(items.clone()),
                    Some(previous) if *previous != items => QueryEvent::Updated(items.clone()),
                    Some(_) => continue,
                };
                debug!("Search of {} found {} items", scope.display(), items.len());
                if sink.send(event).is_err() {
                    break;
                }
                last = Some(items);
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for DirectoryQuery {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Default)]
struct ManualShared {
    sink: Option<UnboundedSender<QueryEvent>>,
    starts: usize,
}

/// A query whose results are pushed by the caller.
///
/// Clones share state: hand one to the catalog and keep another to deliver
/// results and observe whether the search was started.
#[derive(Clone, Default)]
pub struct ManualQuery {
    shared: Arc<Mutex<ManualShared>>,
}

impl ManualQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn shared(&self) -> MutexGuard<'_, ManualShared> {
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// How many times the query has been started.
    pub fn start_count(&self) -> usize {
        self.shared().starts
    }

    /// Delivers the initial results. Returns false if the query is not running.
    pub fn finish_gathering(&self, items: Vec<QueryItem>) -> bool {
        self.send(QueryEvent::FinishedGathering(items))
    }

    /// Delivers updated results. Returns false if the query is not running.
    pub fn update(&self, items: Vec<QueryItem>) -> bool {
        self.send(QueryEvent::Updated(items))
    }

    fn send(&self, event: QueryEvent) -> bool {
        match &self.shared().sink {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }
}

impl MetadataQuery for ManualQuery {
    fn start(&mut self, sink: UnboundedSender<QueryEvent>) -> Result<()> {
        let mut shared = self.shared();
        if shared.sink.is_none() {
            shared.sink = Some(sink);
            shared.starts += 1;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.shared().sink = None;
    }

    fn is_running(&self) -> bool {
        self.shared().sink.is_some()
    }
}

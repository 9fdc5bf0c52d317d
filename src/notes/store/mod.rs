//! # Storage Layer
//!
//! The storage layer is everything the catalog and the document host consume
//! but do not implement: directory listing, handing files to the cloud sync
//! client, download status, and whole-package reads and writes.
//!
//! ## Two Places Notes Live
//!
//! 1. **Local**: a plain directory only this device sees.
//! 2. **Cloud**: a directory kept in sync by an external client. Items there
//!    may be placeholders until downloaded.
//!
//! A note is moved from local to cloud, never copied, so the cloud search is
//! the single source of truth once syncing is on.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: real directories. Placeholders follow the
//!   `.<name>.icloud` convention; downloads run a configured command.
//! - [`mem_backend::MemBackend`]: in memory, with failure injection, for tests.
//!
//! The remote search lives in [`query`]: [`query::DirectoryQuery`] polls the
//! cloud directory, [`query::ManualQuery`] is driven by hand.

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod query;

pub use backend::{DownloadStatus, StorageBackend};
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use query::{DirectoryQuery, ManualQuery, MetadataQuery, QueryEvent, QueryItem};

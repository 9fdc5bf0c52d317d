//! # Notes Architecture
//!
//! Notes is a library for package-format note documents and the catalog that
//! keeps them visible across a local directory and a cloud-synced one. The
//! `notes` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prompts, formats output                │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Starts the catalog, parses selectors                     │
//! │  - Dispatches to commands with a catalog snapshot           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │  Commands (commands/*.rs)    │  Catalog (catalog/)          │
//! │  - Open, edit, export notes  │  - One task owns the list    │
//! │  - Return CmdResult          │  - Scan, search, migrate     │
//! └──────────────────────────────┴──────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Package (package/) and Storage (store/)                    │
//! │  - NoteDocument <-> FileWrapper <-> directory on disk       │
//! │  - StorageBackend, MetadataQuery traits + implementations   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! From `api.rs` inward nothing writes to stdout or stderr; diagnostics go
//! through the `log` facade and the binary decides where they end up.
//!
//! ## Testing Strategy
//!
//! Every layer below the CLI runs against [`store::MemBackend`],
//! [`store::ManualQuery`] and [`settings::MemSettingsStore`], so the catalog
//! and commands are tested without touching the filesystem. The filesystem
//! backend and the binary have integration tests under `tests/`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`catalog`]: The catalog task and its handle
//! - [`commands`]: One module per command
//! - [`package`]: Package layout, codec, documents, host
//! - [`store`]: Storage backends and the cloud search
//! - [`model`]: Styled text and locations
//! - [`markup`]: Markdown in and out of styled text
//! - [`settings`]: The persisted storage-mode flags
//! - [`config`]: Configuration management
//! - [`init`]: Directory resolution
//! - [`logging`]: Logger bootstrap for the binary
//! - [`error`]: Error types

pub mod api;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod init;
pub mod logging;
pub mod markup;
pub mod model;
pub mod package;
pub mod settings;
pub mod store;

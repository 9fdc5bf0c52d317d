//! # CLI Behavior
//!
//! One client of the notes library. The only place that knows about terminal
//! I/O, exit codes and output formatting.
//!
//! ## Naked Execution (`notes`)
//!
//! Running `notes` with no arguments lists notes.
//!
//! ## First Run
//!
//! The catalog asks once where notes should live. The answer comes from
//! `--storage cloud|local`, or an interactive prompt when attached to a
//! terminal; otherwise notes stay local. It is remembered in `settings.json`.
//!
//! ## Text Input
//!
//! `new` and `write` take markdown from their arguments or, when none are
//! given, from piped stdin.
//!
//! ## Structure
//!
//! - `run()`: context setup, catalog start, dispatch
//! - `handle_*()`: per-command handlers that call the API and print
//! - `print`: output formatting
//! - `prompt`: the storage question

mod args;
mod print;
mod prompt;
mod styles;

use args::{Cli, Commands};
use clap::Parser;
use notes::api::{ConfigAction, NotesApi};
use notes::error::{NotesError, Result};
use notes::init::resolve_paths;
use notes::logging;
use notes::model::Location;
use notes::settings::JsonSettingsStore;
use notes::store::{DirectoryQuery, FsBackend};
use print::{print_config, print_full_notes, print_messages, print_notes, print_paths};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

struct AppContext {
    api: NotesApi<FsBackend>,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut ctx = init_context()?;

    // Configuration does not need the catalog.
    if let Some(Commands::Config { key, value }) = cli.command {
        return handle_config(&ctx, key, value);
    }

    let mode = match ctx.api.start().await? {
        Some(mode) => mode,
        None => {
            let wanted = prompt::choose_mode(cli.storage)?;
            ctx.api.choose_mode(wanted).await?
        }
    };
    ctx.api.sync(mode).await?;

    let outcome = match cli.command {
        Some(Commands::List) | None => handle_list(&ctx).await,
        Some(Commands::New { text }) => handle_new(&ctx, text).await,
        Some(Commands::Show { selectors }) => handle_show(&ctx, selectors).await,
        Some(Commands::Write { selector, text }) => handle_write(&ctx, selector, text).await,
        Some(Commands::Locate {
            selector,
            lat,
            lon,
            name,
        }) => handle_locate(&ctx, selector, lat, lon, name).await,
        Some(Commands::Export { selectors, output }) => {
            handle_export(&ctx, selectors, output).await
        }
        Some(Commands::Path { selectors }) => handle_paths(&ctx, selectors).await,
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
    };

    ctx.api.shutdown().await?;
    outcome
}

fn init_context() -> Result<AppContext> {
    let (paths, config) = resolve_paths()?;

    let backend = FsBackend::new(paths.local_dir.clone(), paths.cloud_dir.clone())
        .with_download_command(config.download_command.clone());
    let query = DirectoryQuery::new(
        paths.cloud_dir.clone(),
        Duration::from_millis(config.poll_interval_ms),
    );
    let settings = JsonSettingsStore::new(&paths.config_dir);
    let api = NotesApi::open(Arc::new(backend), query, settings, paths);

    Ok(AppContext { api })
}

/// Joins argument words, falling back to piped stdin.
fn text_input(words: Vec<String>) -> Result<Option<String>> {
    if !words.is_empty() {
        return Ok(Some(words.join(" ")));
    }
    if std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(NotesError::Io)?;
    Ok((!buffer.trim().is_empty()).then_some(buffer))
}

async fn handle_list(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.list_notes().await?;
    print_notes(&result.listed_notes);
    print_messages(&result.messages);
    Ok(())
}

async fn handle_new(ctx: &AppContext, text: Vec<String>) -> Result<()> {
    let markdown = text_input(text)?;
    let result = ctx.api.create_note(markdown.as_deref()).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_show(ctx: &AppContext, selectors: Vec<String>) -> Result<()> {
    let result = ctx.api.show_notes(&selectors).await?;
    print_full_notes(&result.shown_notes);
    print_messages(&result.messages);
    Ok(())
}

async fn handle_write(ctx: &AppContext, selector: String, text: Vec<String>) -> Result<()> {
    let markdown = text_input(text)?
        .ok_or_else(|| NotesError::Api("Nothing to write: pass text or pipe it in".into()))?;
    let result = ctx.api.write_note(&selector, &markdown).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_locate(
    ctx: &AppContext,
    selector: String,
    lat: f64,
    lon: f64,
    name: Option<String>,
) -> Result<()> {
    let mut location = Location::new(lat, lon);
    if let Some(name) = name {
        location = location.named(name);
    }
    let result = ctx.api.locate_note(&selector, &location).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_export(
    ctx: &AppContext,
    selectors: Vec<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let result = ctx.api.export_notes(&selectors, output).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_paths(ctx: &AppContext, selectors: Vec<String>) -> Result<()> {
    let result = ctx.api.note_paths(&selectors).await?;
    print_paths(&result.note_paths);
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let show_all = key.is_none();
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = ctx.api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    print_messages(&result.messages);
    Ok(())
}

use super::helpers::{indexed_notes, notes_by_selectors};
use super::{CmdMessage, CmdResult, DisplayNote, NoteSelector};
use crate::catalog::CatalogEntry;
use crate::error::{NotesError, Result};
use crate::package::DocumentHost;
use crate::store::StorageBackend;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Writes the selected packages (all notes when none are selected) into a
/// gzip'd tar archive, one directory per note.
pub fn run<B: StorageBackend>(
    host: &DocumentHost<B>,
    entries: &[CatalogEntry],
    selectors: &[NoteSelector],
    output: Option<PathBuf>,
) -> Result<CmdResult> {
    let notes = if selectors.is_empty() {
        indexed_notes(entries)
    } else {
        notes_by_selectors(entries, selectors)?
    };

    let mut result = CmdResult::default();
    let (ready, pending): (Vec<DisplayNote>, Vec<DisplayNote>) =
        notes.into_iter().partition(|dn| dn.entry.openable);
    for dn in &pending {
        result.add_message(CmdMessage::warning(format!(
            "Skipping {}: not downloaded yet.",
            dn.entry.display_name
        )));
    }
    if ready.is_empty() {
        result.add_message(CmdMessage::info("No notes to export."));
        return Ok(result);
    }

    let filename = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "notes-{}.tar.gz",
            Utc::now().format("%Y-%m-%d_%H-%M-%S")
        ))
    });
    let file = File::create(&filename).map_err(NotesError::Io)?;
    write_archive(host, file, &ready)?;

    result.add_message(CmdMessage::success(format!(
        "Exported {} note(s) to {}",
        ready.len(),
        filename.display()
    )));
    Ok(result.with_note_paths(vec![filename]))
}

fn write_archive<B: StorageBackend, W: Write>(
    host: &DocumentHost<B>,
    writer: W,
    notes: &[DisplayNote],
) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for dn in notes {
        let package = host.backend().read_package(&dn.entry.location)?;
        for (relative, contents) in package.regular_files() {
            let entry_name = format!("notes/{}/{}", dn.entry.display_name, relative);
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            tar.append_data(&mut header, entry_name, contents)
                .map_err(NotesError::Io)?;
        }
    }

    let enc = tar.into_inner().map_err(NotesError::Io)?;
    enc.finish().map_err(NotesError::Io)?;
    Ok(())
}

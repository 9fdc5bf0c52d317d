use super::helpers::notes_by_selectors;
use super::{CmdMessage, CmdResult, NoteSelector, NoteView};
use crate::catalog::CatalogEntry;
use crate::error::Result;
use crate::package::DocumentHost;
use crate::store::StorageBackend;
use log::warn;

pub fn run<B: StorageBackend>(
    host: &DocumentHost<B>,
    entries: &[CatalogEntry],
    selectors: &[NoteSelector],
) -> Result<CmdResult> {
    let notes = notes_by_selectors(entries, selectors)?;
    let mut result = CmdResult::default();
    let mut views = Vec::with_capacity(notes.len());

    for dn in notes {
        if !dn.entry.openable {
            result.add_message(CmdMessage::warning(format!(
                "{} is not downloaded yet.",
                dn.entry.display_name
            )));
            continue;
        }
        let doc = host.open(&dn.entry.location)?;
        let location = match doc.location() {
            Ok(location) => location,
            Err(e) => {
                warn!("Ignoring location of {}: {}", dn.entry.display_name, e);
                None
            }
        };
        views.push(NoteView {
            index: dn.index,
            name: dn.entry.display_name,
            text: doc.text().clone(),
            location,
        });
    }

    Ok(result.with_shown_notes(views))
}

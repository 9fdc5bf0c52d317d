use super::helpers::notes_by_selectors;
use super::{CmdResult, NoteSelector};
use crate::catalog::CatalogEntry;
use crate::error::Result;

pub fn run(entries: &[CatalogEntry], selectors: &[NoteSelector]) -> Result<CmdResult> {
    let paths = notes_by_selectors(entries, selectors)?
        .into_iter()
        .map(|dn| dn.entry.location)
        .collect();
    Ok(CmdResult::default().with_note_paths(paths))
}

use super::helpers::notes_by_selectors;
use super::{CmdMessage, CmdResult, NoteSelector};
use crate::catalog::CatalogEntry;
use crate::error::{NotesError, Result};
use crate::model::StyledText;
use crate::package::{DocumentHost, SaveOperation};
use crate::store::StorageBackend;

/// Replaces a note's text with `markdown`.
pub fn run<B: StorageBackend>(
    host: &DocumentHost<B>,
    entries: &[CatalogEntry],
    selector: &NoteSelector,
    markdown: &str,
) -> Result<CmdResult> {
    let notes = notes_by_selectors(entries, std::slice::from_ref(selector))?;
    let dn = notes
        .into_iter()
        .next()
        .ok_or_else(|| NotesError::NoteNotFound(selector.to_string()))?;
    if !dn.entry.openable {
        return Err(NotesError::Api(format!(
            "{} is not downloaded yet",
            dn.entry.display_name
        )));
    }

    let mut doc = host.open(&dn.entry.location)?;
    doc.set_text(StyledText::from_markdown(markdown));
    host.save(&dn.entry.location, &mut doc, SaveOperation::ForOverwriting)?;

    let mut result = CmdResult::default().with_note_paths(vec![dn.entry.location]);
    result.add_message(CmdMessage::success(format!(
        "Updated {}",
        dn.entry.display_name
    )));
    Ok(result)
}

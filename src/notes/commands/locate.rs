use super::helpers::notes_by_selectors;
use super::{CmdMessage, CmdResult, NoteSelector};
use crate::catalog::CatalogEntry;
use crate::error::{NotesError, Result};
use crate::model::Location;
use crate::package::{DocumentHost, SaveOperation};
use crate::store::StorageBackend;

/// Attaches a place to a note. A note keeps the first location it was saved
/// with.
pub fn run<B: StorageBackend>(
    host: &DocumentHost<B>,
    entries: &[CatalogEntry],
    selector: &NoteSelector,
    location: &Location,
) -> Result<CmdResult> {
    if !(-90.0..=90.0).contains(&location.latitude)
        || !(-180.0..=180.0).contains(&location.longitude)
    {
        return Err(NotesError::Api(format!(
            "Invalid coordinates: {}, {}",
            location.latitude, location.longitude
        )));
    }

    let dn = notes_by_selectors(entries, std::slice::from_ref(selector))?
        .into_iter()
        .next()
        .ok_or_else(|| NotesError::NoteNotFound(selector.to_string()))?;
    if !dn.entry.openable {
        return Err(NotesError::Api(format!(
            "{} is not downloaded yet",
            dn.entry.display_name
        )));
    }

    let mut result = CmdResult::default().with_note_paths(vec![dn.entry.location.clone()]);
    let mut doc = host.open(&dn.entry.location)?;
    if doc.has_stored_location() {
        result.add_message(CmdMessage::warning(format!(
            "{} already has a location; keeping it.",
            dn.entry.display_name
        )));
        return Ok(result);
    }

    doc.set_location(location)?;
    host.save(&dn.entry.location, &mut doc, SaveOperation::ForOverwriting)?;
    result.add_message(CmdMessage::success(format!(
        "Located {}",
        dn.entry.display_name
    )));
    Ok(result)
}

use super::{DisplayNote, NoteSelector};
use crate::catalog::CatalogEntry;
use crate::error::{NotesError, Result};
use crate::package::NOTE_EXTENSION;

pub fn indexed_notes(entries: &[CatalogEntry]) -> Vec<DisplayNote> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| DisplayNote {
            index: i + 1,
            entry: entry.clone(),
        })
        .collect()
}

fn matches_name(entry: &CatalogEntry, name: &str) -> bool {
    if entry.display_name == name {
        return true;
    }
    entry
        .display_name
        .strip_suffix(NOTE_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        == Some(name)
}

/// Resolves selectors in the order given. Fails on the first one that matches
/// nothing.
pub fn notes_by_selectors(
    entries: &[CatalogEntry],
    selectors: &[NoteSelector],
) -> Result<Vec<DisplayNote>> {
    let indexed = indexed_notes(entries);
    let mut found = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let note = match selector {
            NoteSelector::Index(n) => indexed.iter().find(|dn| dn.index == *n),
            NoteSelector::Name(name) => indexed.iter().find(|dn| matches_name(&dn.entry, name)),
        };
        match note {
            Some(note) => found.push(note.clone()),
            None => return Err(NotesError::NoteNotFound(selector.to_string())),
        }
    }
    Ok(found)
}


#[cfg(test)]
mod tests {
    use super::fixtures::entry;
    use super::*;
    use std::path::PathBuf;

    fn entries() -> Vec<CatalogEntry> {
        vec![
            entry(PathBuf::from("/l/Document 1.note"), true),
            entry(PathBuf::from("/l/Groceries.note"), true),
        ]
    }

    #[test]
    fn resolves_by_index_and_name() {
        let found = notes_by_selectors(
            &entries(),
            &[
                NoteSelector::Name("Groceries".into()),
                NoteSelector::Index(1),
                NoteSelector::Name("Document 1.note".into()),
            ],
        )
        .unwrap();
        let indexes: Vec<usize> = found.iter().map(|dn| dn.index).collect();
        assert_eq!(indexes, vec![2, 1, 1]);
    }

    #[test]
    fn unknown_selector_is_not_found() {
        let err = notes_by_selectors(&entries(), &[NoteSelector::Index(3)]).unwrap_err();
        assert!(matches!(err, NotesError::NoteNotFound(s) if s == "3"));
    }
}

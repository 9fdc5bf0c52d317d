use super::helpers::indexed_notes;
use super::{CmdMessage, CmdResult};
use crate::catalog::CatalogEntry;
use crate::error::Result;

pub fn run(entries: &[CatalogEntry]) -> Result<CmdResult> {
    let listed = indexed_notes(entries);
    let mut result = CmdResult::default();
    let pending = listed.iter().filter(|dn| !dn.entry.openable).count();
    if pending > 0 {
        result.add_message(CmdMessage::info(format!(
            "{} note(s) still downloading.",
            pending
        )));
    }
    Ok(result.with_listed_notes(listed))
}

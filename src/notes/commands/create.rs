use super::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::StyledText;
use crate::package::{DocumentHost, SaveOperation};
use crate::store::StorageBackend;
use std::path::PathBuf;

/// Fills a freshly created note with `markdown`, if any.
pub fn run<B: StorageBackend>(
    host: &DocumentHost<B>,
    path: PathBuf,
    markdown: Option<&str>,
) -> Result<CmdResult> {
    if let Some(markdown) = markdown.filter(|m| !m.trim().is_empty()) {
        let mut doc = host.open(&path)?;
        doc.set_text(StyledText::from_markdown(markdown));
        host.save(&path, &mut doc, SaveOperation::ForOverwriting)?;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut result = CmdResult::default().with_note_paths(vec![path]);
    result.add_message(CmdMessage::success(format!("Created {}", name)));
    Ok(result)
}

use super::args::Storage;
use super::styles::{PROMPT, WARNING};
use console::Term;
use notes::catalog::SyncMode;
use notes::error::{NotesError, Result};

/// Asks where to keep notes. `--storage` answers without asking; without a
/// terminal notes stay local.
pub fn choose_mode(flag: Option<Storage>) -> Result<SyncMode> {
    if let Some(storage) = flag {
        return Ok(storage.into());
    }

    if !console::user_attended() {
        eprintln!(
            "{}",
            WARNING.apply_to("No storage chosen; keeping notes local. Use --storage cloud to sync.")
        );
        return Ok(SyncMode::Local);
    }

    let term = Term::stdout();
    term.write_str(&format!(
        "{} ",
        PROMPT.apply_to("Keep notes in the cloud folder? [y/N]")
    ))
    .map_err(NotesError::Io)?;
    let answer = term.read_line().map_err(NotesError::Io)?;
    Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> SyncMode {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => SyncMode::Cloud,
        _ => SyncMode::Local,
    }
}

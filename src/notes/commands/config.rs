use crate::commands::{CmdMessage, CmdResult, NotesPaths};
use crate::config::NotesConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(paths: &NotesPaths, action: ConfigAction) -> Result<CmdResult> {
    let dir = &paths.config_dir;
    match action {
        ConfigAction::ShowAll => {
            let config = NotesConfig::load(dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = NotesConfig::load(dir)?;
            let mut result = CmdResult::default();
            match config.get(&key) {
                Ok(Some(val)) => result.add_message(CmdMessage::info(val)),
                Ok(None) => result.add_message(CmdMessage::info(format!("{} is not set", key))),
                Err(e) => result.add_message(CmdMessage::error(e.to_string())),
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = NotesConfig::load(dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut res = CmdResult::default();
                res.add_message(CmdMessage::error(e.to_string()));
                return Ok(res);
            }
            config.save(dir)?;
            let display_val = config
                .get(&key)
                .ok()
                .flatten()
                .unwrap_or_else(|| "(unset)".to_string());
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!(
                "{} set to {}",
                key, display_val
            )));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> NotesPaths {
        NotesPaths {
            config_dir: dir.path().to_path_buf(),
            local_dir: dir.path().join("Notes"),
            cloud_dir: None,
        }
    }

    #[test]
    fn test_set_then_show_key() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        run(
            &paths,
            ConfigAction::Set("poll-interval".into(), "750".into()),
        )
        .unwrap();

        let result = run(&paths, ConfigAction::ShowKey("poll-interval".into())).unwrap();
        assert_eq!(result.messages[0].content, "750");
        assert_eq!(NotesConfig::load(dir.path()).unwrap().poll_interval_ms, 750);
    }

    #[test]
    fn test_unknown_key_is_reported_not_saved() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        let result = run(&paths, ConfigAction::Set("theme".into(), "dark".into())).unwrap();
        assert!(matches!(
            result.messages[0].level,
            crate::commands::MessageLevel::Error
        ));
        assert!(!dir.path().join("config.json").exists());
    }
}

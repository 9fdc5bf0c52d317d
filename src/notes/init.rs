use crate::commands::NotesPaths;
use crate::config::NotesConfig;
use crate::error::{NotesError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Relocates every directory under one root, mainly for testing.
pub const HOME_ENV: &str = "NOTES_HOME";

const NOTES_DIR: &str = "Notes";

/// Resolves where configuration and notes live.
///
/// With `NOTES_HOME` set, configuration sits in that directory and notes in
/// its `Notes` subdirectory. Otherwise the OS-appropriate directories from
/// `directories` are used. `local_dir` and `cloud_dir` from the config file
/// override the defaults.
pub fn resolve_paths() -> Result<(NotesPaths, NotesConfig)> {
    let (config_dir, data_dir) = match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => {
            let home = PathBuf::from(home);
            (home.clone(), home)
        }
        _ => {
            let dirs = ProjectDirs::from("com", "notes", "notes")
                .ok_or_else(|| NotesError::Api("Could not determine config dir".to_string()))?;
            (
                dirs.config_dir().to_path_buf(),
                dirs.data_dir().to_path_buf(),
            )
        }
    };
    paths_in(&config_dir, &data_dir)
}

pub fn paths_in(config_dir: &Path, data_dir: &Path) -> Result<(NotesPaths, NotesConfig)> {
    let config = NotesConfig::load(config_dir)?;
    let paths = NotesPaths {
        config_dir: config_dir.to_path_buf(),
        local_dir: config
            .local_dir
            .clone()
            .unwrap_or_else(|| data_dir.join(NOTES_DIR)),
        cloud_dir: config.cloud_dir.clone(),
    };
    Ok((paths, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_under_data_dir() {
        let dir = TempDir::new().unwrap();
        let (paths, config) = paths_in(dir.path(), &dir.path().join("data")).unwrap();
        assert_eq!(paths.local_dir, dir.path().join("data").join("Notes"));
        assert_eq!(paths.cloud_dir, None);
        assert_eq!(config, NotesConfig::default());
    }

    #[test]
    fn test_config_overrides_dirs() {
        let dir = TempDir::new().unwrap();
        let mut config = NotesConfig::default();
        config.cloud_dir = Some(dir.path().join("cloud"));
        config.local_dir = Some(dir.path().join("mine"));
        config.save(dir.path()).unwrap();

        let (paths, _) = paths_in(dir.path(), dir.path()).unwrap();
        assert_eq!(paths.local_dir, dir.path().join("mine"));
        assert_eq!(paths.cloud_dir, Some(dir.path().join("cloud")));
    }
}

//! Storage backends for preference tiers

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PreferenceError, PreferenceSet};
use crate::workspace::Workspace;

/// File name of the project tier inside `.wpilib/`
pub const PROJECT_PREFERENCES_FILE: &str = "riolink_preferences.toml";

/// Loads and saves preference tiers
pub trait PreferencePersistence: Send + Sync {
    fn load_global(&self) -> Result<PreferenceSet, PreferenceError>;
    fn save_global(&self, set: &PreferenceSet) -> Result<(), PreferenceError>;
    fn load_project(&self, workspace: &Workspace) -> Result<PreferenceSet, PreferenceError>;
    fn save_project(&self, workspace: &Workspace, set: &PreferenceSet)
    -> Result<(), PreferenceError>;
}

/// Keeps nothing; every tier starts empty
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPersistence;

impl PreferencePersistence for NullPersistence {
    fn load_global(&self) -> Result<PreferenceSet, PreferenceError> {
        Ok(PreferenceSet::default())
    }

    fn save_global(&self, _set: &PreferenceSet) -> Result<(), PreferenceError> {
        Ok(())
    }

    fn load_project(&self, _workspace: &Workspace) -> Result<PreferenceSet, PreferenceError> {
        Ok(PreferenceSet::default())
    }

    fn save_project(
        &self,
        _workspace: &Workspace,
        _set: &PreferenceSet,
    ) -> Result<(), PreferenceError> {
        Ok(())
    }
}

/// TOML files: one global file, one file per project under `.wpilib/`
#[derive(Debug, Clone)]
pub struct TomlPersistence {
    global_path: PathBuf,
}

impl TomlPersistence {
    pub fn new(global_path: impl Into<PathBuf>) -> Self {
        Self {
            global_path: global_path.into(),
        }
    }

    /// `<user config dir>/riolink/preferences.toml`
    pub fn in_user_config_dir() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("riolink").join("preferences.toml")))
    }

    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    pub fn project_path(workspace: &Workspace) -> PathBuf {
        workspace.project_dir().join(PROJECT_PREFERENCES_FILE)
    }
}

impl PreferencePersistence for TomlPersistence {
    fn load_global(&self) -> Result<PreferenceSet, PreferenceError> {
        load(&self.global_path)
    }

    fn save_global(&self, set: &PreferenceSet) -> Result<(), PreferenceError> {
        save(&self.global_path, set)
    }

    fn load_project(&self, workspace: &Workspace) -> Result<PreferenceSet, PreferenceError> {
        load(&Self::project_path(workspace))
    }

    fn save_project(
        &self,
        workspace: &Workspace,
        set: &PreferenceSet,
    ) -> Result<(), PreferenceError> {
        save(&Self::project_path(workspace), set)
    }
}

/// Missing file reads as an empty tier
fn load(path: &Path) -> Result<PreferenceSet, PreferenceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no preferences file, using empty tier");
            return Ok(PreferenceSet::default());
        }
        Err(source) => {
            return Err(PreferenceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&content).map_err(|e| PreferenceError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write to a sibling temp file, then rename over the target
fn save(path: &Path, set: &PreferenceSet) -> Result<(), PreferenceError> {
    let io_err = |source| PreferenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let content = toml::to_string(set).map_err(|e| PreferenceError::Serialize(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    debug!(path = %path.display(), "preferences saved");
    Ok(())
}

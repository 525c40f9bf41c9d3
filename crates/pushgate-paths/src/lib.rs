use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found; set $HOME environment variable")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.pushgate/` directory layout.
///
/// Use `resolve()` in production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct PushgatePaths {
    pushgate_dir: PathBuf,
}

impl PushgatePaths {
    /// Resolve paths from the user's home directory (`~/.pushgate`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            pushgate_dir: home.join(".pushgate"),
        })
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(pushgate_dir: PathBuf) -> Self {
        Self { pushgate_dir }
    }

    /// The base `~/.pushgate` directory.
    pub fn pushgate_dir(&self) -> &Path {
        &self.pushgate_dir
    }

    pub fn user_config(&self) -> PathBuf {
        self.pushgate_dir.join("config.toml")
    }

    pub fn scenarios_dir(&self) -> PathBuf {
        self.pushgate_dir.join("scenarios")
    }

    /// Named replay scenario: `~/.pushgate/scenarios/<name>.jsonl`.
    pub fn scenario_file(&self, name: &str) -> PathBuf {
        let safe_name = name.replace('/', "_");
        self.scenarios_dir().join(format!("{safe_name}.jsonl"))
    }

    /// Project-level config: `<project_root>/.pushgate/config.toml`.
    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".pushgate").join("config.toml")
    }
}

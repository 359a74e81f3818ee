use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Optional settings read from `config.yml` in the user config directory.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Config {
    /// Loads the user config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).with_context(|| format!("parsing {:?}", path))
    }

    /// Data directory, with `--data-dir` winning over the file setting.
    pub fn resolve_data_dir(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = flag.or_else(|| self.data_dir.clone()) {
            return Ok(dir);
        }
        let dirs = project_dirs().context("locating data directory")?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "todos")
}

fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.yml"))
}

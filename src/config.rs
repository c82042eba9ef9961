//! Portal configuration.
//!
//! The data directory comes from `--data-dir`, else `$HRDESK_HOME`, else
//! `~/.hrdesk`. An optional `config.toml` inside it tunes the portal; every
//! field has a default, so a partial or missing file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::DEFAULT_HR_DESIGNATION;
use crate::error::{Error, Result};
use crate::view::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS, REVEAL_STEP};

pub const HOME_ENV: &str = "HRDESK_HOME";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Designation id that grants the HR role.
    pub hr_designation_id: String,
    /// Items revealed initially and per "load more".
    pub reveal_step: usize,
    /// Page size used until the user picks one.
    pub default_page_size: usize,
    /// Page sizes offered by the UI.
    pub page_size_options: Vec<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hr_designation_id: DEFAULT_HR_DESIGNATION.to_string(),
            reveal_step: REVEAL_STEP,
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
        }
    }
}

impl Config {
    /// Read `config.toml` from `dir`, or defaults when it does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let mut config: Config = toml::from_str(&raw).map_err(|source| Error::Toml { path, source })?;
        if config.reveal_step == 0 {
            config.reveal_step = REVEAL_STEP;
        }
        if config.default_page_size == 0 {
            config.default_page_size = DEFAULT_PAGE_SIZE;
        }
        config.page_size_options.retain(|n| *n > 0);
        debug!(?config, "loaded config");
        Ok(config)
    }
}

/// Resolve the data directory from an explicit flag, the environment, or home.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".hrdesk")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "hr_designation_id = \"DES-099\"\nreveal_step = 0\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.hr_designation_id, "DES-099");
        assert_eq!(config.reveal_step, REVEAL_STEP);
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "reveal_step = \"many\"").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::Toml { .. })));
    }

    #[test]
    fn explicit_dir_wins() {
        let p = Path::new("/tmp/hrdesk-explicit");
        assert_eq!(data_dir(Some(p)), p.to_path_buf());
    }
}

//! Persisted operator settings (`source`, `target`, `ignore`) in a TOML file.
//!
//! Loaded once at startup and written through on every change.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Default settings file name, resolved against the working directory.
pub const SETTINGS_FILE_NAME: &str = "synckit.toml";

/// On-disk shape of the settings file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// External ignore-list form, e.g. `.DS_Store, *.log`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<String>,
}

/// Write-through store bound to one file.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: StoredSettings,
}

impl SettingsStore {
    /// Load `path`, creating an empty file when it does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let values = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| CliError::SettingsParse {
                path: path.to_path_buf(),
                source: e,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoredSettings::default(),
            Err(e) => {
                return Err(CliError::SettingsRead {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let store = Self {
            path: path.to_path_buf(),
            values,
        };
        if !path.exists() {
            store.save()?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn values(&self) -> &StoredSettings {
        &self.values
    }

    pub fn set_source(&mut self, source: &str) -> Result<()> {
        self.values.source = Some(source.to_string());
        self.save()
    }

    pub fn set_target(&mut self, target: &str) -> Result<()> {
        self.values.target = Some(target.to_string());
        self.save()
    }

    pub fn set_ignore(&mut self, ignore: &str) -> Result<()> {
        self.values.ignore = Some(ignore.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(&self.values)?;
        fs::write(&self.path, content).map_err(|e| CliError::SettingsWrite {
            path: self.path.clone(),
            source: e,
        })
    }
}

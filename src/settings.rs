use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PennywiseError, Result};

pub const DB_FILE: &str = "pennywise.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    /// Rules CSV used by `rules load` when no file is given.
    #[serde(default)]
    pub rules_file: Option<String>,
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            rules_file: None,
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `~/.config/pennywise/settings.json`
fn settings_path() -> PathBuf {
    [".config", "pennywise", "settings.json"]
        .iter()
        .fold(home_dir(), |path, part| path.join(part))
}

fn default_data_dir() -> PathBuf {
    home_dir().join("Documents").join("pennywise")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable settings at {}: {e}", path.display());
            Settings::default()
        }),
        Err(e) => {
            log::warn!("could not read {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = settings_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(settings)
        .map_err(|e| PennywiseError::Settings(e.to_string()))?;
    json.push('\n');
    std::fs::write(&path, json)?;
    log::debug!("saved settings to {}", path.display());
    Ok(())
}

pub fn get_db_path() -> PathBuf {
    load_settings().db_path()
}

/// Expand a leading `~` to the home directory and make the path absolute
/// when it exists. Other paths are returned unchanged.
pub fn shellexpand_path(path: &str) -> String {
    let expanded = match path.strip_prefix('~') {
        Some(rest) => home_dir().join(rest.trim_start_matches('/')),
        None => PathBuf::from(path),
    };
    std::fs::canonicalize(&expanded)
        .unwrap_or(expanded)
        .to_string_lossy()
        .into_owned()
}

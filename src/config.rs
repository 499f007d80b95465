//! Config module - Persisted user settings
//!
//! Settings live in a small JSON file under the platform config directory.
//! A missing or unreadable file is never fatal: defaults are used instead.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ingest::{EncodingPolicy, IngestOptions, DEFAULT_MAX_FILE_SIZE};

const APP_DIR: &str = "FolderDigester";
const SETTINGS_FILE: &str = "settings.json";

/// Output file name suggested before any folder is picked
pub const DEFAULT_OUTPUT: &str = "digest.txt";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub last_folder: Option<PathBuf>,
    pub last_output: Option<PathBuf>,
    pub max_file_size: u64,
    pub include_hidden: bool,
    pub respect_gitignore: bool,
    /// Tried in order after UTF-8
    pub fallback_encodings: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            last_folder: None,
            last_output: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            include_hidden: false,
            respect_gitignore: true,
            fallback_encodings: vec!["utf-8".to_string(), "latin1".to_string()],
        }
    }
}

impl AppSettings {
    /// Default location of the settings file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings, falling back to defaults on any problem
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::warn!("No config directory available, using default settings");
            return Self::default();
        };

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Failed to read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!(
                    "Failed to parse settings {}: {}. Falling back to defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Options handed to the ingestion service for the lifetime of the app
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            encodings: EncodingPolicy::from_labels(self.fallback_encodings.as_slice()),
            max_file_size: self.max_file_size,
            include_hidden: self.include_hidden,
            respect_gitignore: self.respect_gitignore,
        }
    }
}

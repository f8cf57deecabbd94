//! JSON-backed settings store
//!
//! Load never fails. Keys are merged over the defaults one at a time, so a bad
//! value only costs that key; such a file is left as the user wrote it. An
//! absent file, or one that is not JSON at all, yields defaults and a fresh
//! file is written. The load error, if any, is handed back so the caller can
//! show it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::settings::Settings;
use crate::update::{SettingsUpdate, UpdateEffect};

/// File name used when no path is given on the command line
pub const DEFAULT_SETTINGS_FILE: &str = "crosshair_settings.json";

/// Result of [`SettingsStore::load_or_init`]
#[derive(Debug)]
pub struct LoadOutcome {
    pub store: SettingsStore,
    /// Problem worth showing to the user (bad file, or failure writing defaults)
    pub warning: Option<PersistenceError>,
}

/// Owner of the live settings and the file they persist to
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
    dirty: bool,
}

impl SettingsStore {
    /// Create a store without touching the filesystem
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            settings,
            dirty: false,
        }
    }

    /// Load settings from `path`, falling back to defaults and writing a fresh file
    pub fn load_or_init(path: impl Into<PathBuf>) -> LoadOutcome {
        let path = path.into();

        match read_settings(&path) {
            Ok((settings, rejected)) if rejected.is_empty() => {
                info!(path = %path.display(), "Loaded settings");
                LoadOutcome {
                    store: Self::new(path, settings),
                    warning: None,
                }
            }
            Ok((settings, rejected)) => {
                warn!(path = %path.display(), keys = ?rejected, "Invalid settings values, using defaults for them");
                let warning = PersistenceError::InvalidValues {
                    path: path.clone(),
                    keys: rejected,
                };
                LoadOutcome {
                    store: Self::new(path, settings),
                    warning: Some(warning),
                }
            }
            Err(load_err) => {
                if load_err.is_missing_file() {
                    info!(path = %path.display(), "No settings file, writing defaults");
                } else {
                    warn!(path = %path.display(), error = %load_err, "Settings unreadable, using defaults");
                }

                let store = Self::new(path, Settings::default());
                let save_err = store.save().err();

                let warning = if load_err.is_missing_file() {
                    save_err
                } else {
                    Some(load_err)
                };
                LoadOutcome { store, warning }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True when the live settings differ from what was last saved or loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply an update to the live settings
    pub fn apply(&mut self, update: SettingsUpdate) -> UpdateEffect {
        let effect = self.settings.apply(update);
        if effect.repaint || effect.click_through_changed {
            self.dirty = true;
            debug!(?update, "Settings updated");
        }
        effect
    }

    /// Write the full settings object to the store's path
    pub fn save(&self) -> Result<&Path, PersistenceError> {
        write_settings(&self.path, &self.settings)?;
        Ok(&self.path)
    }

    /// Save and clear the dirty flag
    pub fn commit(&mut self) -> Result<&Path, PersistenceError> {
        write_settings(&self.path, &self.settings)?;
        self.dirty = false;
        info!(path = %self.path.display(), "Saved settings");
        Ok(&self.path)
    }
}

/// Parse settings key by key over the defaults.
///
/// Returns the merged settings plus the keys whose values did not fit their
/// field (wrong type, out of range, unknown mode). Only a document that is not
/// JSON, or not an object, is an error.
pub fn merge_json(json: &str) -> Result<(Settings, Vec<String>), serde_json::Error> {
    let fields = match serde_json::from_str::<Value>(json)? {
        Value::Object(fields) => fields,
        other => return serde_json::from_value(other).map(|settings| (settings, Vec::new())),
    };

    let mut merged = match serde_json::to_value(Settings::default())? {
        Value::Object(defaults) => defaults,
        _ => Map::new(),
    };
    let mut rejected = Vec::new();

    for (key, value) in fields {
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value);
        if serde_json::from_value::<Settings>(Value::Object(candidate.clone())).is_ok() {
            merged = candidate;
        } else {
            rejected.push(key);
        }
    }

    let settings = serde_json::from_value(Value::Object(merged))?;
    Ok((settings, rejected))
}

/// Serialize settings with two-space indentation
pub fn to_json(settings: &Settings) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(settings)
}

fn read_settings(path: &Path) -> Result<(Settings, Vec<String>), PersistenceError> {
    let content = fs::read_to_string(path).map_err(|source| PersistenceError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    merge_json(&content).map_err(|source| PersistenceError::ParseJson {
        path: path.to_path_buf(),
        source,
    })
}

fn write_settings(path: &Path, settings: &Settings) -> Result<(), PersistenceError> {
    let json = to_json(settings)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, json).map_err(|source| PersistenceError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

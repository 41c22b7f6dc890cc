use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::domain::Theme;
use crate::error::DexError;

pub const THEME_KEY: &str = "theme";

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DexError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DexError>;
}

#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: Utf8PathBuf,
}

impl FilePreferences {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn at_default_location() -> Result<Self, DexError> {
        let path = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.config_dir()
                        .join("pokedex-viewer")
                        .join("preferences.json"),
                )
                .ok()
            })
            .ok_or_else(|| {
                DexError::Preferences("unable to resolve config directory".to_string())
            })?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, DexError> {
        if !self.path.as_std_path().exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(self.path.as_std_path())
            .map_err(|err| DexError::Preferences(format!("read {}: {err}", self.path)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|err| DexError::Preferences(format!("parse {}: {err}", self.path)))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), DexError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| DexError::Preferences("invalid preferences path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| DexError::Preferences(err.to_string()))?;
        let content = serde_json::to_vec_pretty(values)
            .map_err(|err| DexError::Preferences(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("pokedex-prefs")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| DexError::Preferences(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| DexError::Preferences(err.to_string()))?;
        temp.persist(self.path.as_std_path())
            .map_err(|err| DexError::Preferences(err.to_string()))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Result<Option<String>, DexError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DexError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, DexError> {
        let values = self
            .values
            .lock()
            .map_err(|_| DexError::Preferences("poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DexError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| DexError::Preferences("poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Saved theme when it is recognised, otherwise the system preference,
/// otherwise light. Store failures are logged and never block startup.
pub fn initial_theme(store: &dyn PreferenceStore, system_prefers_dark: bool) -> Theme {
    let saved = match store.get(THEME_KEY) {
        Ok(value) => value.and_then(|value| value.parse::<Theme>().ok()),
        Err(err) => {
            tracing::warn!(error = %err, "preferences unreadable, using system theme");
            None
        }
    };
    let theme = match saved {
        Some(theme) => theme,
        None if system_prefers_dark => Theme::Dark,
        None => Theme::Light,
    };
    if let Err(err) = store.set(THEME_KEY, theme.as_str()) {
        tracing::warn!(error = %err, %theme, "failed to save theme");
    }
    theme
}

pub fn set_theme(store: &dyn PreferenceStore, theme: Theme) -> Result<Theme, DexError> {
    store.set(THEME_KEY, theme.as_str())?;
    tracing::debug!(%theme, "theme saved");
    Ok(theme)
}

pub fn toggle_theme(store: &dyn PreferenceStore, current: Theme) -> Result<Theme, DexError> {
    set_theme(store, current.toggled())
}

pub fn apply_toggle(store: &dyn PreferenceStore, current: Theme) -> (Theme, Option<DexError>) {
    let next = current.toggled();
    match set_theme(store, next) {
        Ok(_) => (next, None),
        Err(err) => {
            tracing::warn!(error = %err, theme = %next, "failed to save theme");
            (next, Some(err))
        }
    }
}

/// Reads the terminal's `COLORFGBG` hint (`fg;bg`, dark backgrounds are
/// colours 0-6 and 8).
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .as_deref()
        .and_then(background_from_colorfgbg)
        .is_some_and(|bg| bg <= 6 || bg == 8)
}

fn background_from_colorfgbg(value: &str) -> Option<u8> {
    value.rsplit(';').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_theme_wins_over_system() {
        let store = MemoryPreferences::default();
        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(initial_theme(&store, true), Theme::Light);
    }

    #[test]
    fn unrecognised_value_falls_back_to_system() {
        let store = MemoryPreferences::default();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(initial_theme(&store, true), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn default_is_light() {
        let store = MemoryPreferences::default();
        assert_eq!(initial_theme(&store, false), Theme::Light);
    }

    #[test]
    fn toggle_persists() {
        let store = MemoryPreferences::default();
        let next = toggle_theme(&store, Theme::Light).unwrap();
        assert_eq!(next, Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn colorfgbg_background_parsing() {
        assert_eq!(background_from_colorfgbg("15;0"), Some(0));
        assert_eq!(background_from_colorfgbg("0;default;15"), Some(15));
        assert_eq!(background_from_colorfgbg("garbage"), None);
    }
}

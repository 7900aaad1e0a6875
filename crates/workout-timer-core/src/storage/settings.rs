//! TOML-based user settings.
//!
//! Stores user preferences including:
//! - Theme and font scale (consumed by a GUI front end)
//! - Sound volume and per-phase sound files
//! - Default parameters for each interval protocol
//!
//! Settings are stored at `~/.config/workout-timer/settings.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::protocol::{BoxingConfig, CustomIntervals, PhaseKind, TabataConfig};

const THEMES: [&str; 3] = ["dark", "light", "system"];

/// Map-valued keys that accept new entries through [`Settings::set`].
const OPEN_MAPS: [&str; 1] = ["sound.phase_sounds"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppearanceConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_scale")]
    pub font_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 0.0 .. 1.0; out-of-range values are clamped when used.
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Directory holding `<kind>.wav` fallbacks. Defaults to `<data dir>/sounds`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sounds_dir: Option<String>,
    /// Phase kind (`"work"`, `"rest"`, ...) to sound file path.
    #[serde(default)]
    pub phase_sounds: BTreeMap<String, String>,
}

/// Values used when a protocol flag is not given on the command line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProtocolDefaults {
    #[serde(default)]
    pub tabata: TabataConfig,
    #[serde(default)]
    pub boxing: BoxingConfig,
    #[serde(default)]
    pub custom: CustomIntervals,
}

/// Application settings.
///
/// Serialized to/from TOML at `~/.config/workout-timer/settings.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub appearance: AppearanceConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub defaults: ProtocolDefaults,
}

fn default_theme() -> String {
    "dark".into()
}
fn default_font_scale() -> f64 {
    1.0
}
fn default_volume() -> f64 {
    0.8
}
fn default_true() -> bool {
    true
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            font_scale: default_font_scale(),
        }
    }
}

impl AppearanceConfig {
    /// The stored theme if recognized, otherwise `"dark"`.
    pub fn theme(&self) -> &str {
        let theme = self.theme.as_str();
        THEMES
            .iter()
            .find(|t| t.eq_ignore_ascii_case(theme))
            .copied()
            .unwrap_or("dark")
    }

    pub fn font_scale(&self) -> f64 {
        if self.font_scale.is_finite() {
            self.font_scale.clamp(0.8, 1.4)
        } else {
            default_font_scale()
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
            sounds_dir: None,
            phase_sounds: BTreeMap::new(),
        }
    }
}

impl SoundConfig {
    pub fn normalized_volume(&self) -> f64 {
        if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Sound file configured for a kind, if any.
    pub fn sound_for(&self, kind: PhaseKind) -> Option<PathBuf> {
        self.phase_sounds
            .get(kind.as_str())
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;

        let new_value = match obj.get(leaf) {
            Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            Some(serde_json::Value::Number(_)) => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(n) = value.parse::<f64>() {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            Some(_) => serde_json::Value::String(value.into()),
            None if parent_path.is_some_and(|p| OPEN_MAPS.contains(&p)) => {
                serde_json::Value::String(value.into())
            }
            None => return Err(unknown()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("settings.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be parsed,
    /// or if the default settings cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a settings value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field (including protocol defaults that would fail validation).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Settings = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate().map_err(invalid)?;
        *self = updated;
        Ok(())
    }

    /// Check the protocol defaults and sound map keys.
    pub fn validate(&self) -> Result<(), String> {
        self.defaults.tabata.validate().map_err(|e| e.to_string())?;
        self.defaults.boxing.validate().map_err(|e| e.to_string())?;
        self.defaults.custom.validate().map_err(|e| e.to_string())?;
        for kind in self.sound.phase_sounds.keys() {
            if !PhaseKind::ALL.iter().any(|k| k.as_str() == kind) {
                return Err(format!("unknown phase kind '{kind}'"));
            }
        }
        Ok(())
    }

    /// Directory searched for `<kind>.wav` when no explicit file is set.
    pub fn sounds_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.sound.sounds_dir {
            Some(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
            _ => Ok(data_dir()?.join("sounds")),
        }
    }

    /// Load from disk, returning defaults (with a warning) on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default settings");
            Self::default()
        })
    }
}

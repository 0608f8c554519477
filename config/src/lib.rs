//! Settings store for Tonedown.
//!
//! The rewrite core only ever reads two settings: the Gemini credential and
//! an optional preferred-model override. They live in
//! `~/.tonedown/config.toml` and can be overridden per-process through the
//! `GEMINI_API_KEY` and `GEMINI_MODEL` environment variables (environment
//! wins). A missing file is not an error; deciding what a missing credential
//! means is the caller's job.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
pub use tonedown_types::{API_KEY_SETTING, MODEL_SETTING};

const CONFIG_DIR: &str = ".tonedown";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("settings file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    /// `~/.tonedown/config.toml`, or `None` when no home directory exists.
    #[must_use]
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the settings file, then apply environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = match Self::path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_SETTING)
            && !key.trim().is_empty()
        {
            self.api_key = Some(key);
        }
        if let Ok(model) = std::env::var(MODEL_SETTING)
            && !model.trim().is_empty()
        {
            self.model = Some(model);
        }
    }

    /// The configured credential, with blank values treated as absent.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// The preferred model, with blank values treated as absent.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
    }
}

//! Persisted user settings and credential resolution.
//!
//! Settings live in their own JSON file beside the jobs file. The
//! credential has a two-level priority: the `OPENAI_API_KEY`
//! environment variable (typically via `.env`) overrides whatever was
//! persisted; absence of both is not an error until an operation
//! actually needs the key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sora_core::defaults::{DEFAULT_DURATION_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SIZE};
use sora_core::SoraError;

/// Environment variable that overrides the persisted credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// User-adjustable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Persisted credential. The environment variable wins over this.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_duration")]
    pub default_duration_secs: u32,

    #[serde(default = "default_size")]
    pub default_size: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

fn default_size() -> String {
    DEFAULT_SIZE.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            default_duration_secs: DEFAULT_DURATION_SECS,
            default_size: DEFAULT_SIZE.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Settings file is corrupt, using defaults");
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read settings, using defaults");
                Self::default()
            }
        }
    }

    /// Persist settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, serialized)
    }

    /// Resolve the credential: environment first, persisted second.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.api_key.clone()
    }

    /// Resolve the credential or fail with
    /// [`SoraError::NotConfigured`].
    pub fn require_api_key(&self) -> Result<String, SoraError> {
        self.resolve_api_key().ok_or(SoraError::NotConfigured)
    }
}

/// Well-known file locations inside a studio data directory.
#[derive(Debug, Clone)]
pub struct StudioPaths {
    pub data_dir: PathBuf,
}

impl StudioPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn jobs_file(&self) -> PathBuf {
        self.data_dir.join("jobs.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

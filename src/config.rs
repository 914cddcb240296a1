use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::AppError;

pub const APP_DIR_NAME: &str = "aura";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const RECENTS_FILE_NAME: &str = "recents.json";
pub const API_URL_ENV: &str = "AURA_API_URL";
pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";
pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;

pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn get_settings_file_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILE_NAME)
}

pub fn get_recents_file_path() -> PathBuf {
    get_config_dir().join(RECENTS_FILE_NAME)
}

/// User preferences. Unknown or missing keys in the saved file fall back to
/// the defaults below.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Personal YouTube Data API key, blank when unset.
    pub user_api_key: String,
    pub precise_search: bool,
    pub show_recommendations: bool,
    /// Base URL of the backend proxy. Empty means same origin.
    pub api_url: String,
    pub ytdlp_path: String,
    pub download_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_api_key: String::new(),
            precise_search: true,
            show_recommendations: true,
            api_url: String::new(),
            ytdlp_path: DEFAULT_YTDLP_BINARY.to_string(),
            download_dir: None,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from(&get_settings_file_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                log::debug!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable settings file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&get_settings_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn user_api_key(&self) -> Option<&str> {
        let key = self.user_api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// Proxy base URL; the `AURA_API_URL` environment variable wins over the
    /// saved value.
    pub fn api_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api_url.clone())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn resolved_download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download_dir {
            return dir.clone();
        }
        dirs::audio_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

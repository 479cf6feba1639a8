use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserRef;
use crate::error::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "https://ticket-tracking-system.onrender.com";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

/// What `config init` writes to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl AppConfig {
    /// Stored values, overridden by `TICKETDESK_*` environment variables.
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::resolve(stored, |key| env::var(key).ok()))
    }

    fn resolve(stored: StoredConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, fallback: Option<String>| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .or(fallback)
        };

        Self {
            api_base_url: pick("TICKETDESK_API_URL", stored.api_base_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            user_id: pick("TICKETDESK_USER_ID", stored.user_id),
            user_name: pick("TICKETDESK_USER_NAME", stored.user_name),
        }
    }

    /// The signed-in user. A missing user name is sent as empty.
    pub fn session(&self) -> AppResult<UserRef> {
        let user_id = self.user_id.as_deref().ok_or_else(|| {
            AppError::Configuration(
                "not signed in; run `ticketdesk config init` or set TICKETDESK_USER_ID".to_string(),
            )
        })?;
        Ok(UserRef::new(
            user_id,
            self.user_name.clone().unwrap_or_default(),
        ))
    }
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    ProjectDirs::from("", "", "ticketdesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| AppError::Configuration("cannot locate a config directory".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

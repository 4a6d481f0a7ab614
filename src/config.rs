use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::connection;
use crate::error::BoardError;

/// Environment override for the current user.
pub const USER_ENV: &str = "LECTIO_BOARD_USER";

/// Board preferences stored next to the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<String>,
}

impl BoardConfig {
    /// Missing or unreadable files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(data) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            Self::default()
        })
    }

    pub fn load() -> Result<Self, BoardError> {
        Ok(Self::load_from(&connection::config_path()?))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), BoardError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| BoardError::transport(e.to_string()))?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn save(&self) -> Result<(), BoardError> {
        self.save_to(&connection::config_path()?)
    }

    /// `--user` beats the environment, which beats the file.
    pub fn effective_user(&self, flag: Option<&str>) -> Option<String> {
        resolve_user(flag, std::env::var(USER_ENV).ok().as_deref(), self.current_user.as_deref())
    }
}

fn resolve_user(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> Option<String> {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|u| !u.is_empty())
        .map(str::to_string)
}

use std::{
    env,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::errors::{AppError, AppResult};

const CONFIG_FILENAME: &str = ".gatorconfig.json";
const DEFAULT_DB_PATH: &str = "gator.db";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// The small JSON document holding the database location and the active user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default, alias = "storage_connection_string")]
    pub db_url: String,
    #[serde(default)]
    pub current_user_name: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Preferences {
    /// `GATOR_CONFIG_PATH` if set, otherwise `~/.gatorconfig.json`.
    pub fn default_path() -> AppResult<PathBuf> {
        if let Ok(path) = env::var("GATOR_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }
        let home = env::var_os("HOME")
            .ok_or_else(|| AppError::ConfigurationError("HOME is not set".to_string()))?;
        Ok(Path::new(&home).join(CONFIG_FILENAME))
    }

    /// Reads the preference file. A missing file yields empty preferences bound to `path`,
    /// so the first `register` or `login` creates it.
    pub fn read(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config file at {}, using defaults", path.display());
                return Ok(Self {
                    path,
                    ..Default::default()
                });
            }
            Err(e) => {
                return Err(AppError::ConfigurationError(format!(
                    "Unable to read file at {}: {e}",
                    path.display()
                )))
            }
        };

        let mut prefs: Preferences = serde_json::from_slice(&data).map_err(|e| {
            AppError::ConfigurationError(format!("Unable to parse config file: {e}"))
        })?;
        prefs.path = path;
        Ok(prefs)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The active user, if one has been selected.
    pub fn current_user(&self) -> Option<&str> {
        let name = self.current_user_name.as_str();
        (!name.is_empty()).then_some(name)
    }

    pub fn set_user(&mut self, name: &str) -> AppResult<()> {
        self.current_user_name = name.to_string();
        self.write()
    }

    /// Replaces the whole file: serialize to a sibling temp file, then rename over the target.
    fn write(&self) -> AppResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let data = serde_json::to_vec_pretty(self).map_err(|e| {
            AppError::ConfigurationError(format!("Unable to serialize config: {e}"))
        })?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| {
            AppError::ConfigurationError(format!("Unable to access config file for write: {e}"))
        })?;
        file.write_all(&data)
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| {
                AppError::ConfigurationError(format!("Unable to write config to file: {e}"))
            })?;
        file.persist(&self.path).map_err(|e| {
            AppError::ConfigurationError(format!("Unable to replace config file: {e}"))
        })?;

        log::debug!("Wrote config to {}", self.path.display());
        Ok(())
    }
}

/// Process settings resolved from the preference file and the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub fetch_timeout: Duration,
}

impl AppConfig {
    pub fn load(prefs: &Preferences) -> AppResult<Self> {
        let db_url = match env::var("GATOR_DATABASE_URL") {
            Ok(url) => {
                log::info!("Using database path from GATOR_DATABASE_URL: {}", url);
                url
            }
            Err(_) if !prefs.db_url.is_empty() => {
                log::info!("Using database path from config file: {}", prefs.db_url);
                prefs.db_url.clone()
            }
            Err(_) => {
                log::info!("Using default database path: {}", DEFAULT_DB_PATH);
                DEFAULT_DB_PATH.to_string()
            }
        };

        let fetch_timeout = match env::var("GATOR_FETCH_TIMEOUT_SECS") {
            Ok(secs) => {
                let secs = secs.parse::<u64>().map_err(|_| {
                    AppError::ConfigurationError(format!(
                        "GATOR_FETCH_TIMEOUT_SECS must be a number of seconds, got '{secs}'"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        Ok(Self {
            db_url,
            fetch_timeout,
        })
    }
}

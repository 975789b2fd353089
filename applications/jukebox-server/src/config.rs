/// Server configuration
use crate::error::{Result, ServerError};
use jukebox_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    /// Engine limits and thresholds
    #[serde(default)]
    pub songs: EngineConfig,

    #[serde(default)]
    pub resolver: ResolverSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// Reads `path`, or `config.toml` in the working directory when it
    /// exists, then applies `JUKEBOX_*` variables on top. Nested keys are
    /// separated by a double underscore (`JUKEBOX_SONGS__MAX_SONGS=20`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("JUKEBOX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.is_empty() {
            return Err(ServerError::Config(
                "Database URL is required (set JUKEBOX_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        self.songs
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(())
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite://./data/jukebox.db".to_string()
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
        }
    }
}

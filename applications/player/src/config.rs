/// Player configuration
use crate::error::{AppError, Result};
use pod_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "pod-player.toml";

/// Prefix for environment overrides (`PODPLAYER_STORAGE__DATABASE_PATH`, ...)
pub const ENV_PREFIX: &str = "PODPLAYER";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Double underscore separates sections so field names keep theirs
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;

        if !(0.0..=1.0).contains(&playback.volume) {
            return Err(AppError::Config(format!(
                "playback.volume must be within [0, 1], got {}",
                playback.volume
            )));
        }

        if pod_playback::PlaybackRate::new(playback.rate).is_none() {
            return Err(AppError::Config(format!(
                "playback.rate must be one of {:?}, got {}",
                pod_playback::ALLOWED_RATES,
                playback.rate
            )));
        }

        if playback.frame_interval_ms == 0
            || playback.sleep_check_interval_ms == 0
            || playback.progress_save_interval_ms == 0
        {
            return Err(AppError::Config(
                "playback intervals must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/pod-player.redb")
}

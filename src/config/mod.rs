use crate::global;
use crate::location::AccuracyProfile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub greeting: GreetingConfig,
    pub camera: CameraConfig,
    pub location: LocationConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    /// Without a key the service skips the network call and uses the fixed greetings.
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: Option<String>,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            api_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Binary PPM file the file-backed camera reads frames from.
    /// Falls back to `<data_dir>/camera/frame.ppm` when unset.
    pub frame_source: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub countdown_from: u8,
    pub tick_millis: u64,
    pub flash_millis: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_source: None,
            width: 1280,
            height: 720,
            countdown_from: 3,
            tick_millis: 1000,
            flash_millis: 300,
        }
    }
}

impl CameraConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn flash_delay(&self) -> Duration {
        Duration::from_millis(self.flash_millis)
    }

    pub fn frame_path(&self) -> Result<PathBuf> {
        match &self.frame_source {
            Some(path) => Ok(path.clone()),
            None => global::default_frame_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub accuracy: AccuracyProfile,
    /// Fixed position reported by this terminal. Both must be set, otherwise
    /// location lookups report the capability as unsupported.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            accuracy: AccuracyProfile::High,
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3838 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config = Self::parse(&content)?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

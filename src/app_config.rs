use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::google_tts::AudioSettings;

/// Application configuration module
/// This module handles loading, validating and saving `conf.json`.
/// Provider credentials are never part of this file; they come from the
/// environment (see `registry::Credentials`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// SQLite database file; defaults to the user's data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Root directory of the binary object store
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Prefix of the public references handed out for stored objects
    #[serde(default)]
    pub public_base_url: String,

    /// Per-endpoint provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Settings shared by every HTTP provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Base URL of the service
    pub endpoint: String,

    /// Per-call time bound
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// A disabled provider is left out of its chain
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl EndpointConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            timeout_secs: default_timeout_secs(),
            enabled: true,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("Endpoint for {} must not be empty", name));
        }
        url::Url::parse(&self.endpoint).with_context(|| format!("Invalid endpoint for {}: {}", name, self.endpoint))?;
        if self.timeout_secs == 0 {
            return Err(anyhow!("Timeout for {} must be greater than zero", name));
        }
        Ok(())
    }
}

/// Speech synthesis endpoint plus voice settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpeechConfig {
    #[serde(flatten)]
    pub endpoint: EndpointConfig,

    #[serde(flatten)]
    pub audio: AudioSettings,
}

/// Provider sections of the configuration file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default = "default_google_vision")]
    pub google_vision: EndpointConfig,

    #[serde(default = "default_google_translate")]
    pub google_translate: EndpointConfig,

    #[serde(default = "default_libre_translate")]
    pub libre_translate: EndpointConfig,

    #[serde(default = "default_google_tts")]
    pub google_tts: SpeechConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            google_vision: default_google_vision(),
            google_translate: default_google_translate(),
            libre_translate: default_libre_translate(),
            google_tts: default_google_tts(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_google_vision() -> EndpointConfig {
    EndpointConfig::new("https://vision.googleapis.com")
}

fn default_google_translate() -> EndpointConfig {
    EndpointConfig::new("https://translation.googleapis.com")
}

fn default_libre_translate() -> EndpointConfig {
    EndpointConfig::new("https://libretranslate.com")
}

fn default_google_tts() -> SpeechConfig {
    SpeechConfig {
        endpoint: EndpointConfig::new("https://texttospeech.googleapis.com"),
        audio: AudioSettings::default(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::default(),
            database_path: None,
            storage_dir: default_storage_dir(),
            public_base_url: String::new(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let providers = &self.providers;
        providers.google_vision.validate("google_vision")?;
        providers.google_translate.validate("google_translate")?;
        providers.libre_translate.validate("libre_translate")?;
        providers.google_tts.endpoint.validate("google_tts")?;

        if providers.google_tts.audio.speaking_rate <= 0.0 {
            return Err(anyhow!("google_tts speaking_rate must be positive"));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage_dir must not be empty"));
        }

        Ok(())
    }

    /// Load the configuration file, writing a default one when it is absent
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            log::warn!("Config file not found at {:?}, creating default config.", path);

            let config = Config::default();
            let config_json =
                serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

            Ok(config)
        }
    }

    /// Database file, falling back to the default location
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}

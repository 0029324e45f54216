//! Application configuration management.
//!
//! Settings for wavetty: where the browser starts, seek step, refresh cadence,
//! audio buffer sizes, the initial visualizer, and logging. Configuration is
//! stored in the user's config directory (typically ~/.config/wavetty/config.toml);
//! a missing file means defaults, and every field falls back to its default
//! when absent.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::playback::{ControllerSettings, VisualizationMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to find config directory")]
    NoConfigDir,
    #[error("Config file error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Keys accepted by [`Config::set_value`].
pub const CONFIG_KEYS: &[&str] = &[
    "start_dir",
    "seek_seconds",
    "refresh_interval_ms",
    "frames_per_buffer",
    "chunk_frames",
    "fft_size",
    "visualization",
    "log_file",
    "log_level",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_start_dir")]
    pub start_dir: String,
    #[serde(default = "default_seek_seconds")]
    pub seek_seconds: i32,
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_frames_per_buffer")]
    pub frames_per_buffer: usize,
    #[serde(default = "default_chunk_frames")]
    pub chunk_frames: usize,
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default)]
    pub visualization: VisualizationMode,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_start_dir() -> String {
    "~".to_string()
}

fn default_seek_seconds() -> i32 {
    5
}

fn default_refresh_interval_ms() -> u64 {
    50
}

fn default_frames_per_buffer() -> usize {
    ControllerSettings::default().frames_per_buffer
}

fn default_chunk_frames() -> usize {
    ControllerSettings::default().chunk_frames
}

fn default_fft_size() -> usize {
    ControllerSettings::default().fft_size
}

fn default_log_file() -> String {
    "/tmp/wavetty.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            start_dir: default_start_dir(),
            seek_seconds: default_seek_seconds(),
            refresh_interval_ms: default_refresh_interval_ms(),
            frames_per_buffer: default_frames_per_buffer(),
            chunk_frames: default_chunk_frames(),
            fft_size: default_fft_size(),
            visualization: VisualizationMode::default(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("wavetty")
        } else {
            dirs::config_dir()
                .ok_or(ConfigError::NoConfigDir)?
                .join("wavetty")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load and validate. Playback relies on the values being usable.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Load without range checks, so `config view` and `config set` can still
    /// show and repair a file with a bad value in it.
    pub fn load_unvalidated() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply the `set_value` rules to values read from a hand-edited file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seek_seconds <= 0 {
            return Err(ConfigError::invalid("seek_seconds", "must be at least 1"));
        }
        for (key, value) in [
            ("refresh_interval_ms", self.refresh_interval_ms as usize),
            ("frames_per_buffer", self.frames_per_buffer),
            ("chunk_frames", self.chunk_frames),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(key, "must be at least 1"));
            }
        }
        if !is_fft_size(self.fft_size) {
            return Err(ConfigError::invalid("fft_size", "must be a power of two"));
        }
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(ConfigError::invalid("log_level", LOG_LEVELS));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, ConfigError> {
        Ok(Self::config_path()?.exists())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "start_dir" => self.start_dir = value.to_string(),
            "seek_seconds" => {
                let seconds = parse_number::<i32>(key, value)?;
                if seconds <= 0 {
                    return Err(ConfigError::invalid(key, "must be at least 1"));
                }
                self.seek_seconds = seconds;
            }
            "refresh_interval_ms" => {
                let ms = parse_number::<u64>(key, value)?;
                if ms == 0 {
                    return Err(ConfigError::invalid(key, "must be at least 1"));
                }
                self.refresh_interval_ms = ms;
            }
            "frames_per_buffer" => self.frames_per_buffer = parse_positive(key, value)?,
            "chunk_frames" => self.chunk_frames = parse_positive(key, value)?,
            "fft_size" => {
                let size = parse_positive(key, value)?;
                if !is_fft_size(size) {
                    return Err(ConfigError::invalid(key, "must be a power of two"));
                }
                self.fft_size = size;
            }
            "visualization" => {
                self.visualization = value
                    .parse()
                    .map_err(|e: String| ConfigError::invalid(key, e))?;
            }
            "log_file" => self.log_file = value.to_string(),
            "log_level" => {
                value
                    .parse::<LevelFilter>()
                    .map_err(|_| ConfigError::invalid(key, LOG_LEVELS))?;
                self.log_level = value.to_ascii_lowercase();
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Browser start directory with `~` and environment variables expanded.
    pub fn start_dir_path(&self) -> PathBuf {
        match shellexpand::full(&self.start_dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.start_dir).as_ref()),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            chunk_frames: self.chunk_frames.max(1),
            frames_per_buffer: self.frames_per_buffer.max(1),
            fft_size: self.fft_size,
        }
    }
}

const LOG_LEVELS: &str = "expected off, error, warn, info, debug or trace";

fn is_fft_size(size: usize) -> bool {
    size >= 2 && size.is_power_of_two()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(key, format!("'{value}' is not a number")))
}

fn parse_positive(key: &str, value: &str) -> Result<usize, ConfigError> {
    let n = parse_number::<usize>(key, value)?;
    if n == 0 {
        return Err(ConfigError::invalid(key, "must be at least 1"));
    }
    Ok(n)
}

//! Application configuration management.
//!
//! Player preferences are stored in the user's config directory (typically
//! ~/.config/tapedeck/config.toml). Every field has a default, so a missing
//! file or a partial file both load cleanly.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::APP_DIR;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_waveform")]
    pub waveform: bool,
    #[serde(default = "default_repeat")]
    pub repeat: bool,
    #[serde(default = "default_thumbnail_peaks")]
    pub thumbnail_peaks: usize,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_tick_interval_ms() -> u64 {
    20
}

fn default_waveform() -> bool {
    true
}

fn default_repeat() -> bool {
    false
}

fn default_thumbnail_peaks() -> usize {
    2048
}

fn default_log_file() -> String {
    "/tmp/tapedeck.log".to_string()
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            waveform: default_waveform(),
            repeat: default_repeat(),
            thumbnail_peaks: default_thumbnail_peaks(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join(APP_DIR)
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join(APP_DIR)
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Log file path with `~` and environment variables expanded.
    pub fn log_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        let expanded = shellexpand::full(&self.log_file)?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter, Box<dyn Error>> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| format!("Invalid log level: {}", self.log_level).into())
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than zero".into());
        }
        if self.thumbnail_peaks == 0 {
            return Err("thumbnail_peaks must be greater than zero".into());
        }
        self.log_level_filter()?;
        Ok(())
    }

    /// Update a single key. The config is left untouched if the new value
    /// does not validate.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let mut updated = self.clone();
        match key {
            "tick_interval_ms" => {
                updated.tick_interval_ms = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a positive number of milliseconds")?;
            }
            "waveform" => {
                updated.waveform = value
                    .parse::<bool>()
                    .map_err(|_| "Value must be 'true' or 'false'")?;
            }
            "repeat" => {
                updated.repeat = value
                    .parse::<bool>()
                    .map_err(|_| "Value must be 'true' or 'false'")?;
            }
            "thumbnail_peaks" => {
                updated.thumbnail_peaks = value
                    .parse::<usize>()
                    .map_err(|_| "Value must be a positive number")?;
            }
            "log_file" => updated.log_file = value.to_string(),
            "log_level" => updated.log_level = value.to_string(),
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests that modify environment variables don't run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.tick_interval_ms, 20);
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
        assert!(config.waveform);
        assert!(!config.repeat);
        assert_eq!(config.thumbnail_peaks, 2048);
        assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("waveform = false\n").unwrap();
        assert!(!config.waveform);
        assert_eq!(config.tick_interval_ms, 20);
        assert_eq!(config.log_file, default_log_file());
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::new();

        config.set_value("tick_interval_ms", "40").unwrap();
        assert_eq!(config.tick_interval_ms, 40);

        config.set_value("waveform", "false").unwrap();
        assert!(!config.waveform);

        config.set_value("repeat", "true").unwrap();
        assert!(config.repeat);

        config.set_value("log_level", "info").unwrap();
        assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Info);

        assert!(config.set_value("waveform", "maybe").is_err());
        assert!(config.set_value("tick_interval_ms", "-5").is_err());
        assert!(config.set_value("tick_interval_ms", "0").is_err());
        assert!(config.set_value("log_level", "loud").is_err());
        assert!(config.set_value("unknown_key", "value").is_err());
        assert_eq!(config.tick_interval_ms, 40);
    }

    #[test]
    fn test_log_path_expands_home() {
        let mut config = Config::new();
        config.log_file = "~/tapedeck.log".to_string();
        let path = config.log_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("tapedeck.log"));
    }

    #[test]
    fn test_config_save_and_load() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut config = Config::new();
        config.tick_interval_ms = 33;
        config.save().unwrap();

        let config_path = Config::config_path().unwrap();
        assert!(config_path.exists());
        assert!(config_path.starts_with(temp_dir.path().join(APP_DIR)));

        let loaded = Config::load().unwrap();
        assert_eq!(loaded.tick_interval_ms, 33);
        assert!(loaded.waveform);

        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let dir = temp_dir.path().join(APP_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "tick_interval_ms = 0\n").unwrap();
        assert!(Config::load().is_err());

        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }
}

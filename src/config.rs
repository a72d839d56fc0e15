//! Driver settings
//!
//! Loaded from `drivers.toml` in the user's config directory. Every field has
//! a default, so a missing or partial file still yields a usable
//! configuration; a file that is present but broken is reported and then
//! replaced by defaults in [`DriverSettings::load_or_default`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_DIR_NAME: &str = "controller-drivers";
const CONFIG_FILE_NAME: &str = "drivers.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DriverSettings {
    /// Duration sent with every body rumble request
    pub rumble_duration_ms: u32,

    /// Duration sent with every trigger rumble request
    pub trigger_rumble_duration_ms: u32,

    /// Search for the DualSense audio device and enable HD haptics
    pub hd_haptics: bool,

    /// Lowercase substrings identifying the DualSense audio device by name
    pub haptic_device_tokens: Vec<String>,

    /// Channel count the haptic audio device must expose
    pub haptic_device_channels: u16,

    /// Driver ticks per second
    pub tick_rate: u32,

    /// Deadzone applied to every deadzone group
    pub default_deadzone: f32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            rumble_duration_ms: 5000,
            trigger_rumble_duration_ms: 0,
            // HD haptics through the audio device are broken on macOS
            hd_haptics: !cfg!(target_os = "macos"),
            haptic_device_tokens: vec![
                "dualsense".to_string(),
                "ps5".to_string(),
                "wireless controller".to_string(),
            ],
            haptic_device_channels: 4,
            tick_rate: 20,
            default_deadzone: 0.05,
        }
    }
}

impl DriverSettings {
    /// `<config dir>/controller-drivers/drivers.toml`, if the platform has a
    /// config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings: DriverSettings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading driver settings from {}", path.display());
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Loads from [`Self::default_path`], falling back to defaults when the
    /// file is missing or unusable
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory on this platform, using default driver settings");
            return Self::default();
        };

        if !path.exists() {
            info!(
                "No driver settings at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load(&path) {
            Ok(settings) => {
                info!("Loaded driver settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Unable to load driver settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Saved driver settings to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid(
                "tick_rate must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.default_deadzone) {
            return Err(ConfigError::Invalid(format!(
                "default_deadzone must be in [0, 1), got {}",
                self.default_deadzone
            )));
        }
        if self.haptic_device_channels == 0 {
            return Err(ConfigError::Invalid(
                "haptic_device_channels must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `device_name` looks like the DualSense audio interface
    pub fn matches_haptic_device(&self, device_name: &str) -> bool {
        let name = device_name.to_lowercase();
        self.haptic_device_tokens
            .iter()
            .any(|token| name.contains(token.as_str()))
    }
}

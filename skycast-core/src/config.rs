use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::TemperatureUnit;

/// Top-level configuration stored on disk.
///
/// Open-Meteo needs no credentials, so the only persistent preference is
/// the display unit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default temperature unit, e.g. "celsius" or "fahrenheit".
    pub default_unit: Option<String>,
}

impl Config {
    /// Return the default unit as a strongly-typed value, falling back to
    /// Celsius when nothing is configured.
    pub fn default_unit(&self) -> Result<TemperatureUnit> {
        match self.default_unit.as_deref() {
            Some(s) => TemperatureUnit::try_from(s),
            None => Ok(TemperatureUnit::default()),
        }
    }

    pub fn set_default_unit(&mut self, unit: TemperatureUnit) {
        self.default_unit = Some(unit.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "skycast")
            .context("Failed to determine platform config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

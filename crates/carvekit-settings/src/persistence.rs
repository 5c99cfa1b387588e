//! Configuration persistence.
//!
//! Loads and saves `CarveConfig` as TOML or JSON, selected by file
//! extension. A platform default location is used when no explicit path
//! is given.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CarveConfig;
use crate::error::{SettingsError, SettingsResult};

impl CarveConfig {
    /// Platform default configuration path
    /// (e.g. `~/.config/carvekit/config.toml` on Linux).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("carvekit").join("config.toml"))
    }

    /// Load a configuration file; format is chosen by extension
    /// (`.toml` or `.json`). The loaded configuration is validated.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: CarveConfig = match extension_of(path)? {
            ConfigFormat::Toml => toml::from_str(&contents)?,
            ConfigFormat::Json => serde_json::from_str(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration; format is chosen by extension.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SettingsResult<()> {
        let path = path.as_ref();
        let contents = match extension_of(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(e.to_string()))?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load the configuration from the platform default path, or fall
    /// back to defaults when no file exists there.
    pub fn load_default() -> SettingsResult<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }
}

enum ConfigFormat {
    Toml,
    Json,
}

fn extension_of(path: &Path) -> SettingsResult<ConfigFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(ConfigFormat::Toml),
        Some("json") => Ok(ConfigFormat::Json),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

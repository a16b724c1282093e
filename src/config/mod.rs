use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::{PortalError, Result};

/// Overrides the directory that holds `config.json`.
pub const HOME_ENV: &str = "LICENSE_PORTAL_HOME";

const APP_DIR: &str = "license_portal";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Upper bound for `delay_scale`.
pub const MAX_DELAY_SCALE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rows per page in the license table.
    pub page_size: usize,
    /// Multiplier for simulated pauses; 0 turns them off.
    pub delay_scale: f64,
    pub plain_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 10,
            delay_scale: 1.0,
            plain_output: false,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 3] = ["page_size", "delay_scale", "plain_output"];

    /// Updates one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let mut updated = self.clone();
        match key {
            "page_size" => {
                updated.page_size = value.parse().map_err(|_| invalid(key, value))?;
            }
            "delay_scale" => {
                updated.delay_scale = value.parse().map_err(|_| invalid(key, value))?;
            }
            "plain_output" => {
                updated.plain_output = match value.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => true,
                    "false" | "no" | "off" | "0" => false,
                    _ => return Err(invalid(key, value)),
                };
            }
            other => {
                return Err(PortalError::Config(format!(
                    "unknown setting `{other}` (expected one of {})",
                    Self::KEYS.join(", ")
                )))
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Range checks shared by `set` and values read from disk.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(invalid("page_size", &self.page_size.to_string()));
        }
        if !(0.0..=MAX_DELAY_SCALE).contains(&self.delay_scale) {
            return Err(PortalError::Config(format!(
                "`{}` is not a valid value for delay_scale (expected 0 to {MAX_DELAY_SCALE})",
                self.delay_scale
            )));
        }
        Ok(())
    }

    /// `(key, value)` pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page_size", self.page_size.to_string()),
            ("delay_scale", self.delay_scale.to_string()),
            ("plain_output", self.plain_output.to_string()),
        ]
    }
}

fn invalid(key: &str, value: &str) -> PortalError {
    PortalError::Config(format!("`{value}` is not a valid value for {key}"))
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(Self::base_dir()?)
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
        })
    }

    fn base_dir() -> Result<PathBuf> {
        if let Some(home) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(home));
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| PortalError::Config("no configuration directory available".into()))
    }

    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            let config: Config = serde_json::from_str(&data)?;
            config.validate().map_err(|err| match err {
                PortalError::Config(message) => {
                    PortalError::Config(format!("{}: {message}", self.path.display()))
                }
                other => other,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().join("nested")).unwrap();
        let mut config = Config::default();
        config.set("page_size", "2").unwrap();
        config.set("delay_scale", "0").unwrap();
        manager.save(&config).unwrap();

        assert!(!tmp_path(manager.path()).exists());
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.page_size, 2);
        assert_eq!(loaded.delay_scale, 0.0);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "plain_output": true }"#).unwrap();
        let config = manager.load().unwrap();
        assert!(config.plain_output);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn hand_edited_values_are_checked_on_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "delay_scale": 1e300 }"#).unwrap();
        let err = manager.load().unwrap_err();
        assert!(err.to_string().contains("delay_scale"), "{err}");

        fs::write(manager.path(), r#"{ "page_size": 0 }"#).unwrap();
        assert!(manager.load().is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("page_size", "0").is_err());
        assert!(config.set("delay_scale", "-1").is_err());
        assert!(config.set("delay_scale", "1e300").is_err());
        assert!(config.set("delay_scale", "NaN").is_err());
        assert!(config.set("plain_output", "maybe").is_err());
        assert!(config.set("theme", "dark").is_err());
        assert_eq!(config, Config::default());
    }
}

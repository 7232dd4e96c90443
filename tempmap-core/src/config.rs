use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    ColorPolicy, HeightScale,
    present::{DEFAULT_COLUMN_RADIUS_M, DEFAULT_MAP_STYLE, MapOptions},
    provider::openmeteo::DEFAULT_BASE_URL,
};

/// Top-level configuration stored on disk. Every field has a default, so a
/// partial (or absent) file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Forecast endpoint.
    pub api_base_url: String,

    pub request_timeout_secs: u64,

    /// How long a fetch result is reused before hitting the network again.
    pub cache_ttl_secs: u64,

    /// Column meters per °C.
    pub default_scale: f64,

    pub color_policy: ColorPolicy,

    pub column_radius_m: u32,

    pub map_style: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 10,
            cache_ttl_secs: 600,
            default_scale: HeightScale::DEFAULT.get(),
            color_policy: ColorPolicy::default(),
            column_radius_m: DEFAULT_COLUMN_RADIUS_M,
            map_style: DEFAULT_MAP_STYLE.to_string(),
        }
    }
}

impl Config {
    /// Reject values that would make the session misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(anyhow!("cache_ttl_secs must be greater than zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be greater than zero"));
        }
        self.scale()?;
        Ok(())
    }

    pub fn scale(&self) -> Result<HeightScale> {
        HeightScale::new(self.default_scale)
            .map_err(|e| anyhow!("{e}.\nHint: fix `default_scale` in {}", Self::display_path()))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn map_options(&self, labels: bool) -> MapOptions {
        MapOptions {
            radius_m: self.column_radius_m,
            map_style: self.map_style.clone(),
            labels,
            ..MapOptions::default()
        }
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
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

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "tempmap", "tempmap")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn display_path() -> String {
        Self::config_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "config.toml".to_string())
    }
}

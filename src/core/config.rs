use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use super::currency::{BaseCurrency, ConversionTarget, CurrencyBoxConfig};
use crate::providers::frankfurter::DEFAULT_BASE_URL;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrankfurterProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub frankfurter: Option<FrankfurterProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            frankfurter: Some(FrankfurterProviderConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub base: BaseCurrency,
    pub conversions: Vec<ConversionTarget>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let currency_box = CurrencyBoxConfig::default();
        AppConfig {
            base: currency_box.base,
            conversions: currency_box.conversions,
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path` when given. Without a path, falls back to the built-in
    /// currency box when no config file has been set up yet.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "ratebox", "ratebox")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn currency_box(&self) -> CurrencyBoxConfig {
        CurrencyBoxConfig {
            base: self.base.clone(),
            conversions: self.conversions.clone(),
        }
    }

    pub fn frankfurter_base_url(&self) -> &str {
        self.providers
            .frankfurter
            .as_ref()
            .map_or(DEFAULT_BASE_URL, |p| &p.base_url)
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings read from `config.toml`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    /// Load config from `explicit`, or from the default location if it exists.
    ///
    /// A missing default file yields an empty config; a missing explicit file
    /// is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "using config file");
        Ok(config)
    }

    /// `<config_dir>/hsctl/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hsctl").join("config.toml"))
    }

    /// Pick the API key: the flag (or `HUBSPOT_API_KEY`, which clap folds into
    /// the flag) wins over the config file. Empty strings count as unset.
    pub fn resolve_api_key(&self, flag: Option<&str>) -> Result<String> {
        flag.filter(|k| !k.is_empty())
            .or(self.api_key.as_deref().filter(|k| !k.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "API key is required. Set HUBSPOT_API_KEY env var or use --api-key flag"
                )
            })
    }
}

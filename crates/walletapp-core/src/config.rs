//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the backend address, request timeout, where tokens are kept and
//! the last used username.
//!
//! Configuration is stored at `~/.config/walletapp/config.json`; environment
//! variables override individual fields.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::transport::DEFAULT_TIMEOUT_SECS;
use crate::auth::{FileBackend, KeyringBackend, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "walletapp";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Token file name in the data directory
const TOKEN_FILE: &str = "tokens.json";

/// Hosted backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "https://walletapp-89se.onrender.com/";

const ENV_API_URL: &str = "WALLET_API_URL";
const ENV_TOKEN_STORAGE: &str = "WALLET_TOKEN_STORAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

impl FromStr for TokenStorage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStorage::File),
            "keyring" | "keychain" => Ok(TokenStorage::Keyring),
            other => Err(anyhow::anyhow!("Unknown token storage: {}", other)),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub token_storage: TokenStorage,
    #[serde(default)]
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_url(),
            request_timeout_secs: default_timeout(),
            token_storage: TokenStorage::default(),
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], but an unreadable file falls back to the
    /// defaults. Environment overrides apply either way.
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from_or_default(&path, |key| std::env::var(key).ok()),
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                let mut config = Self::default();
                config.apply_env(|key| std::env::var(key).ok());
                config
            }
        }
    }

    fn load_from<F: Fn(&str) -> Option<String>>(path: &Path, lookup: F) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(lookup);
        Ok(config)
    }

    fn load_from_or_default<F: Fn(&str) -> Option<String>>(path: &Path, lookup: F) -> Self {
        match Self::load_from(path, &lookup) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                let mut config = Self::default();
                config.apply_env(lookup);
                config
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides. Takes a lookup so tests need not touch
    /// the process environment.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(storage) = lookup(ENV_TOKEN_STORAGE) {
            match storage.parse() {
                Ok(storage) => self.token_storage = storage,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_TOKEN_STORAGE),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Open the token store selected by `token_storage`
    pub fn token_store(&self) -> TokenStore {
        match self.token_storage {
            TokenStorage::Keyring => TokenStore::new(Box::new(KeyringBackend)),
            TokenStorage::File => {
                let dir = Self::data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
                TokenStore::new(Box::new(FileBackend::new(dir.join(TOKEN_FILE))))
            }
        }
    }
}

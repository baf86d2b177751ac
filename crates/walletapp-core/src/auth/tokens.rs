//! Persisted access/refresh token pair.
//!
//! `TokenStore` keeps the current pair in memory and writes through to a
//! [`TokenBackend`]. Expiry is not tracked here; the API client finds out a
//! token is stale when the backend answers 401.

use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Keychain service name for the keyring backend
const SERVICE_NAME: &str = "walletapp";

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "access_token", alias = "access")]
    pub access: String,
    #[serde(rename = "refresh_token", alias = "refresh")]
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens never show up in logs or panics
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Durable key/value storage for the token pair.
pub trait TokenBackend: Send + Sync {
    fn load(&self) -> Result<Option<TokenPair>>;
    fn store(&self, pair: &TokenPair) -> Result<()>;
    fn erase(&self) -> Result<()>;
}

/// JSON file holding `access_token` and `refresh_token`.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenBackend for FileBackend {
    fn load(&self) -> Result<Option<TokenPair>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read token file")?;
        let pair: TokenPair =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(pair))
    }

    fn store(&self, pair: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(pair)?;
        std::fs::write(&self.path, contents).context("Failed to write token file")?;
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

/// Two OS keychain entries, one per token.
pub struct KeyringBackend;

impl KeyringBackend {
    fn entry(key: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")
    }

    fn read(key: &str) -> Result<Option<String>> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn remove(key: &str) -> Result<()> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

impl TokenBackend for KeyringBackend {
    fn load(&self) -> Result<Option<TokenPair>> {
        match (Self::read(ACCESS_TOKEN_KEY)?, Self::read(REFRESH_TOKEN_KEY)?) {
            (Some(access), Some(refresh)) => Ok(Some(TokenPair { access, refresh })),
            _ => Ok(None),
        }
    }

    fn store(&self, pair: &TokenPair) -> Result<()> {
        Self::entry(ACCESS_TOKEN_KEY)?
            .set_password(&pair.access)
            .context("Failed to store access token in keychain")?;
        Self::entry(REFRESH_TOKEN_KEY)?
            .set_password(&pair.refresh)
            .context("Failed to store refresh token in keychain")?;
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        Self::remove(ACCESS_TOKEN_KEY)?;
        Self::remove(REFRESH_TOKEN_KEY)
    }
}

/// Process-local storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    pair: Mutex<Option<TokenPair>>,
}

impl TokenBackend for MemoryBackend {
    fn load(&self) -> Result<Option<TokenPair>> {
        Ok(self.pair.lock().map_err(|_| anyhow::anyhow!("token lock poisoned"))?.clone())
    }

    fn store(&self, pair: &TokenPair) -> Result<()> {
        *self.pair.lock().map_err(|_| anyhow::anyhow!("token lock poisoned"))? = Some(pair.clone());
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        *self.pair.lock().map_err(|_| anyhow::anyhow!("token lock poisoned"))? = None;
        Ok(())
    }
}

pub struct TokenStore {
    backend: Box<dyn TokenBackend>,
    current: RwLock<Option<TokenPair>>,
}

impl TokenStore {
    /// Open the store, loading any pair the backend already holds
    pub fn new(backend: Box<dyn TokenBackend>) -> Self {
        let current = match backend.load() {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to load stored tokens, starting logged out");
                None
            }
        };
        debug!(has_tokens = current.is_some(), "Token store opened");
        Self {
            backend,
            current: RwLock::new(current),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::<MemoryBackend>::default())
    }

    pub fn save(&self, pair: TokenPair) {
        if let Err(e) = self.backend.store(&pair) {
            warn!(error = %e, "Failed to persist tokens");
        }
        *self.write_guard() = Some(pair);
    }

    pub fn read(&self) -> Option<TokenPair> {
        self.read_guard().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_guard().as_ref().map(|p| p.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_guard().as_ref().map(|p| p.refresh.clone())
    }

    /// Replace the access token after a refresh, keeping the refresh token
    /// unless the backend rotated it. No-op when the store was cleared.
    pub fn set_access(&self, access: String, rotated_refresh: Option<String>) {
        let updated = {
            let mut guard = self.write_guard();
            match guard.as_mut() {
                Some(pair) => {
                    pair.access = access;
                    if let Some(refresh) = rotated_refresh {
                        pair.refresh = refresh;
                    }
                    Some(pair.clone())
                }
                None => None,
            }
        };
        if let Some(pair) = updated {
            if let Err(e) = self.backend.store(&pair) {
                warn!(error = %e, "Failed to persist refreshed token");
            }
        }
    }

    pub fn clear(&self) {
        *self.write_guard() = None;
        if let Err(e) = self.backend.erase() {
            warn!(error = %e, "Failed to erase stored tokens");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_none()
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, Option<TokenPair>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Option<TokenPair>> {
        self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("walletapp-test-{}-{}", name, std::process::id()))
            .join("tokens.json")
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let path = temp_token_path("reopen");
        let store = TokenStore::new(Box::new(FileBackend::new(path.clone())));
        store.save(TokenPair::new("a1", "r1"));

        let reopened = TokenStore::new(Box::new(FileBackend::new(path.clone())));
        assert_eq!(reopened.read(), Some(TokenPair::new("a1", "r1")));

        reopened.clear();
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_uses_named_keys() {
        let path = temp_token_path("keys");
        let backend = FileBackend::new(path.clone());
        backend.store(&TokenPair::new("a", "r")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[ACCESS_TOKEN_KEY], "a");
        assert_eq!(raw[REFRESH_TOKEN_KEY], "r");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let path = temp_token_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        let store = TokenStore::new(Box::new(FileBackend::new(path.clone())));
        assert!(store.is_empty());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_set_access_keeps_refresh() {
        let store = TokenStore::in_memory();
        store.save(TokenPair::new("old", "refresh"));
        store.set_access("new".to_string(), None);
        assert_eq!(store.access_token().as_deref(), Some("new"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh"));

        store.set_access("newer".to_string(), Some("rotated".to_string()));
        assert_eq!(store.refresh_token().as_deref(), Some("rotated"));
    }

    #[test]
    fn test_set_access_after_clear_is_noop() {
        let store = TokenStore::in_memory();
        store.save(TokenPair::new("a", "r"));
        store.clear();
        store.set_access("late".to_string(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", TokenPair::new("secret-a", "secret-r"));
        assert!(!rendered.contains("secret"));
    }
}

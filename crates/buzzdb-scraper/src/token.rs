//! Rotating anti-replay transaction token for the Twitter adapter.
//!
//! The `x-client-transaction-id` header must change on every request. The
//! rotator owns the current value explicitly and persists it through an
//! injected [`TokenStore`] — a JSON state file in production, an in-memory
//! slot in tests — so the sequence survives process restarts and never
//! reuses a value.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Durable storage for the current transaction token.
pub trait TokenStore {
    /// Returns the persisted token, or `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::TokenState`] if the backing store cannot be read.
    fn load(&self) -> Result<Option<String>, ScraperError>;

    /// Persists `token` as the current value.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::TokenState`] if the backing store cannot be written.
    fn save(&self, token: &str) -> Result<(), ScraperError>;
}

#[derive(Serialize, Deserialize)]
struct TokenStateDoc {
    transaction_id: String,
}

/// JSON-file-backed token store: `{"transaction_id": "..."}`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ScraperError> {
        if !Path::new(&self.path).exists() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| ScraperError::TokenState {
                path: self.path_str(),
                reason: e.to_string(),
            })?;
        let doc: TokenStateDoc =
            serde_json::from_str(&content).map_err(|e| ScraperError::TokenState {
                path: self.path_str(),
                reason: e.to_string(),
            })?;
        Ok(Some(doc.transaction_id))
    }

    fn save(&self, token: &str) -> Result<(), ScraperError> {
        let doc = TokenStateDoc {
            transaction_id: token.to_owned(),
        };
        let content = serde_json::to_string(&doc).map_err(|e| ScraperError::TokenState {
            path: self.path_str(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, content).map_err(|e| ScraperError::TokenState {
            path: self.path_str(),
            reason: e.to_string(),
        })
    }
}

/// In-memory token store for tests. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ScraperError> {
        Ok(self.slot.lock().expect("token slot poisoned").clone())
    }

    fn save(&self, token: &str) -> Result<(), ScraperError> {
        *self.slot.lock().expect("token slot poisoned") = Some(token.to_owned());
        Ok(())
    }
}

/// Deterministic transaction-token rotation with persisted carry.
pub struct TransactionRotator<S: TokenStore> {
    current: String,
    store: S,
}

impl<S: TokenStore> TransactionRotator<S> {
    /// Builds a rotator seeded from the store's persisted value, falling
    /// back to `seed` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::TokenState`] if the store cannot be read.
    pub fn new(seed: &str, store: S) -> Result<Self, ScraperError> {
        let current = store.load()?.unwrap_or_else(|| seed.to_owned());
        Ok(Self { current, store })
    }

    /// Returns the current token and rotates to the next value, persisting
    /// the new state.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::TokenState`] if the store cannot be written.
    pub fn next(&mut self) -> Result<String, ScraperError> {
        let issued = self.current.clone();
        self.current = increment_base62(&self.current);
        self.store.save(&self.current)?;
        Ok(issued)
    }

    /// Current token without rotating.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }
}

/// Increments the trailing base62 position of `token`, carrying into earlier
/// positions on overflow. Non-alphanumeric characters are skipped.
fn increment_base62(token: &str) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    let mut i = chars.len();

    while i > 0 {
        i -= 1;
        let Some(idx) = BASE62.iter().position(|&b| b as char == chars[i]) else {
            continue;
        };
        if idx < BASE62.len() - 1 {
            chars[i] = BASE62[idx + 1] as char;
            return chars.into_iter().collect();
        }
        // Overflow: reset this position and carry left.
        chars[i] = BASE62[0] as char;
    }

    chars.into_iter().collect()
}

//! Durable key-value storage contract.
//!
//! The cart persists through a [`KeyValueStore`]: one string key, one string
//! value, last write wins. Implementations may defer the physical write; a
//! successful `set` only means the write was accepted.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

/// Longest key accepted by [`validate_key`].
pub const MAX_KEY_LENGTH: usize = 64;

/// Errors reported by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key is empty, too long, or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Backend can no longer accept operations.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be accepted.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be accepted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Check that `key` is safe to use as a file name on any platform.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] for empty, over-long or
/// non `[A-Za-z0-9_-]` keys.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("memory store lock poisoned".to_string())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("cart-storage").is_ok());
        assert!(validate_key("user_1").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("cart-storage").unwrap(), None);

        store.set("cart-storage", "one".to_string()).unwrap();
        store.set("cart-storage", "two".to_string()).unwrap();
        assert_eq!(store.get("cart-storage").unwrap().as_deref(), Some("two"));

        store.remove("cart-storage").unwrap();
        store.remove("cart-storage").unwrap();
        assert_eq!(store.get("cart-storage").unwrap(), None);
    }

    #[test]
    fn test_memory_store_rejects_bad_keys() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set("no/slashes", String::new()),
            Err(StorageError::InvalidKey(_))
        ));
    }
}

//! File-backed key-value store for the persisted cart.
//!
//! Each key maps to `<dir>/<key>.json`. Reads are served from an in-memory
//! copy once a key has been touched; writes update that copy immediately and
//! are flushed to disk by a single background task, in order.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use dummymart_core::storage::validate_key;
use dummymart_core::{KeyValueStore, StorageError};

enum WriteOp {
    Set { key: String, value: String },
    Remove { key: String },
    Flush(oneshot::Sender<()>),
}

/// Directory-backed [`KeyValueStore`].
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

struct FileStoreInner {
    dir: PathBuf,
    // `None` marks a key known to be absent.
    entries: RwLock<HashMap<String, Option<String>>>,
    writer: mpsc::UnboundedSender<WriteOp>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("dir", &self.inner.dir)
            .finish_non_exhaustive()
    }
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// Must be called from within a Tokio runtime; the writer task is
    /// spawned onto it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(dir.clone(), rx));

        Ok(Self {
            inner: Arc::new(FileStoreInner {
                dir,
                entries: RwLock::new(HashMap::new()),
                writer,
            }),
        })
    }

    /// Directory the store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    /// Wait until every write accepted so far has reached disk.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.inner.writer.send(WriteOp::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    fn remember(&self, key: &str, value: Option<String>) -> Result<(), StorageError> {
        self.inner
            .entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn enqueue(&self, op: WriteOp) -> Result<(), StorageError> {
        self.inner
            .writer
            .send(op)
            .map_err(|_| StorageError::Unavailable("file writer stopped".to_string()))
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("file store lock poisoned".to_string())
}

fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;

        if let Some(cached) = self.inner.entries.read().map_err(poisoned)?.get(key) {
            return Ok(cached.clone());
        }

        let value = match std::fs::read_to_string(entry_path(&self.inner.dir, key)) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        self.remember(key, value.clone())?;
        Ok(value)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        validate_key(key)?;
        self.remember(key, Some(value.clone()))?;
        self.enqueue(WriteOp::Set {
            key: key.to_string(),
            value,
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.remember(key, None)?;
        self.enqueue(WriteOp::Remove {
            key: key.to_string(),
        })
    }
}

// =============================================================================
// Writer Task
// =============================================================================

async fn run_writer(dir: PathBuf, mut rx: mpsc::UnboundedReceiver<WriteOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            WriteOp::Set { key, value } => {
                if let Err(e) = write_atomic(&dir, &key, &value).await {
                    warn!(key = %key, error = %e, "Failed to write storage entry");
                } else {
                    debug!(key = %key, bytes = value.len(), "Wrote storage entry");
                }
            }
            WriteOp::Remove { key } => match tokio::fs::remove_file(entry_path(&dir, &key)).await {
                Ok(()) => debug!(key = %key, "Removed storage entry"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to remove storage entry"),
            },
            WriteOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn write_atomic(dir: &Path, key: &str, value: &str) -> std::io::Result<()> {
    let target = entry_path(dir, key);
    let tmp = dir.join(format!("{key}.json.tmp"));
    tokio::fs::write(&tmp, value).await?;
    tokio::fs::rename(&tmp, &target).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_is_visible_before_flush() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("cart-storage", "{}".to_string()).unwrap();
        assert_eq!(store.get("cart-storage").unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_flush_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("cart-storage", "first".to_string()).unwrap();
        store.set("cart-storage", "second".to_string()).unwrap();
        store.flush().await;

        let on_disk = std::fs::read_to_string(dir.path().join("cart-storage.json")).unwrap();
        assert_eq!(on_disk, "second");
        assert!(!dir.path().join("cart-storage.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_reopen_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cart-storage.json"), "saved").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("cart-storage").unwrap().as_deref(), Some("saved"));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("cart-storage", "x".to_string()).unwrap();
        store.flush().await;
        store.remove("cart-storage").unwrap();
        store.remove("cart-storage").unwrap();
        store.flush().await;

        assert_eq!(store.get("cart-storage").unwrap(), None);
        assert!(!dir.path().join("cart-storage.json").exists());
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.set("../escape", String::new()),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get("a/b"), Err(StorageError::InvalidKey(_))));
    }
}

//! Persisted client state.
//!
//! The client keeps exactly three keys: `access`, `refresh` and `username`.
//! They are written together on login and removed together on every teardown
//! path, so a reader never observes one token without the other.

use crate::model::TokenPair;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Storage key of the access token.
pub const ACCESS_KEY: &str = "access";
/// Storage key of the refresh token.
pub const REFRESH_KEY: &str = "refresh";
/// Storage key of the logged-in username.
pub const USERNAME_KEY: &str = "username";

/// Errors raised by a [`TokenStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O failed for {path}: {message}")]
    Io {
        /// File that could not be accessed
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// The backing file does not contain a JSON object of strings
    #[error("Storage data is corrupt: {0}")]
    Corrupt(String),

    /// A session write failed and undoing the keys already written failed too
    #[error("{write}; rollback also failed: {rollback}")]
    RollbackFailed {
        /// Error of the write that was rolled back
        write: Box<StorageError>,
        /// Error of the failed removal
        rollback: Box<StorageError>,
    },
}

/// Synchronous string key-value store.
///
/// Mirrors the browser storage the client persisted its session in: small,
/// synchronous and shared by every component of the process.
pub trait TokenStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Session-level operations over any [`TokenStorage`].
pub trait SessionPersistence {
    /// Both persisted tokens, or `None` unless both are present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn load_tokens(&self) -> Result<Option<TokenPair>, StorageError>;

    /// Persist a freshly obtained session.
    ///
    /// Keys are written `refresh`, `access`, `username`. On failure the keys
    /// already written are removed in reverse order, stopping at the first
    /// removal that fails, so `access` is never left without `refresh`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any key cannot be written, or
    /// [`StorageError::RollbackFailed`] if the rollback failed as well.
    fn persist_session(&self, tokens: &TokenPair, username: &str) -> Result<(), StorageError>;

    /// Remove `access`, `refresh` and `username`.
    ///
    /// Every key is attempted even if an earlier removal fails.
    ///
    /// # Errors
    ///
    /// Returns the first `StorageError` encountered.
    fn clear_session(&self) -> Result<(), StorageError>;
}

impl<S: TokenStorage + ?Sized> SessionPersistence for S {
    fn load_tokens(&self) -> Result<Option<TokenPair>, StorageError> {
        let access = self.get(ACCESS_KEY)?;
        let refresh = self.get(REFRESH_KEY)?;

        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(TokenPair { access, refresh })
            }
            _ => None,
        })
    }

    fn persist_session(&self, tokens: &TokenPair, username: &str) -> Result<(), StorageError> {
        let entries = [
            (REFRESH_KEY, tokens.refresh.as_str()),
            (ACCESS_KEY, tokens.access.as_str()),
            (USERNAME_KEY, username),
        ];

        let mut written = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if let Err(write) = self.set(key, value) {
                return match rollback(self, &written) {
                    Ok(()) => Err(write),
                    Err(rollback) => {
                        tracing::error!(
                            error = %write,
                            rollback_error = %rollback,
                            "Failed to roll back partially persisted session"
                        );
                        Err(StorageError::RollbackFailed {
                            write: Box::new(write),
                            rollback: Box::new(rollback),
                        })
                    }
                };
            }
            written.push(key);
        }
        Ok(())
    }

    fn clear_session(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in [ACCESS_KEY, REFRESH_KEY, USERNAME_KEY] {
            if let Err(e) = self.remove(key) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

// Whatever remains after a stop is a prefix of the write order.
fn rollback<S: TokenStorage + ?Sized>(storage: &S, written: &[&str]) -> Result<(), StorageError> {
    written.iter().rev().try_for_each(|key| storage.remove(key))
}

/// In-process storage.
///
/// Contents live as long as the value; useful for tests and for embedders
/// that handle persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored key.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// JSON file storage that survives process restarts.
///
/// The whole map is rewritten on every change: first to `<file>.tmp`, then
/// renamed over the real file. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    guard: Mutex<()>,
}

impl FileStorage {
    /// Storage backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(io_error(&self.path, &e)),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
        }

        let content =
            serde_json::to_string_pretty(values).map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(|e| io_error(&temp_path, &e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| io_error(&self.path, &e))
    }

    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        if change(&mut values) {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|values| values.remove(key).is_some())
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

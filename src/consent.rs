//! Terms-and-conditions consent, kept in a small key-value preference store.
//!
//! DESIGN
//! ======
//! `FileKeyValue` keeps every key in one JSON object on disk and rewrites the
//! whole file on each change. A missing or unreadable file reads as empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::ErrorCode;

/// Preference key holding the consent flag.
pub const TERMS_AGREED_KEY: &str = "termsAgreed";

#[derive(Debug, thiserror::Error)]
pub enum KeyValueError {
    #[error("preferences io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences encode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorCode for KeyValueError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_PREFS_IO",
            Self::Json(_) => "E_PREFS_JSON",
        }
    }
}

/// Durable string preferences.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error when the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueError>;

    /// # Errors
    ///
    /// Returns an error when the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), KeyValueError>;
}

/// Whether the user has accepted the terms: the key is present.
#[must_use]
pub fn terms_agreed(prefs: &dyn KeyValueStore) -> bool {
    prefs.get(TERMS_AGREED_KEY).is_some()
}

/// # Errors
///
/// Returns an error when the flag cannot be persisted.
pub fn record_agreement(prefs: &dyn KeyValueStore) -> Result<(), KeyValueError> {
    prefs.set(TERMS_AGREED_KEY, "true")
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryKeyValue {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with consent already recorded.
    #[must_use]
    pub fn agreed() -> Self {
        let prefs = Self::new();
        prefs.lock().insert(TERMS_AGREED_KEY.into(), "true".into());
        prefs
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKeyValue {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueError> {
        self.lock().insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueError> {
        self.lock().remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

#[derive(Debug)]
pub struct FileKeyValue {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "preferences file unreadable; starting empty");
            BTreeMap::new()
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), KeyValueError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValue {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load();
        values.insert(key.into(), value.into());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load();
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

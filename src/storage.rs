//! Storage layer for homekeep
//!
//! The whole application state lives in one JSON document stored under a
//! fixed key. On disk that is a single file inside the data directory:
//!
//! ```text
//! <data-dir>/
//!   hogares_pwa_v1.json        # AppState document
//!   hogares_pwa_v1.json.lock   # advisory lock for readers/writers
//!   config.toml                # optional configuration
//! ```
//!
//! Loading never fails because of bad content: a missing or unreadable
//! document is replaced by defaults, written back, and reported through
//! [`LoadOrigin`].

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use directories::ProjectDirs;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{default_categories, default_places, AppState, DocumentParts};

/// Fixed key the state document is stored under
pub const STATE_KEY: &str = "hogares_pwa_v1";

/// Name of the optional configuration file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

const APP_NAME: &str = "homekeep";

/// How the state returned by [`StateStore::load`] came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    /// An existing document was read
    Loaded,
    /// No document existed; defaults were created and persisted
    Created,
    /// The stored document was unreadable; defaults replaced it
    RecoveredFromCorruption,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub state: AppState,
    pub origin: LoadOrigin,
}

/// A key-value slot holding the serialized state document
pub trait StateStore {
    /// Raw document bytes, or `None` when nothing has been stored yet
    fn read(&mut self) -> Result<Option<Vec<u8>>>;

    /// Overwrite the stored document
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Load the state, resetting to defaults when absent or corrupted
    fn load(&mut self) -> Result<LoadOutcome> {
        let origin = match self.read()? {
            Some(raw) => match decode_document(&raw) {
                Ok((state, reassigned_ids)) => {
                    tracing::debug!(tasks = state.tasks.len(), "loaded state document");
                    if reassigned_ids > 0 {
                        tracing::debug!(reassigned_ids, "persisting newly assigned task ids");
                        self.save(&state)?;
                    }
                    return Ok(LoadOutcome {
                        state,
                        origin: LoadOrigin::Loaded,
                    });
                }
                Err(reason) => {
                    tracing::warn!(%reason, "state document unreadable; resetting to defaults");
                    LoadOrigin::RecoveredFromCorruption
                }
            },
            None => {
                tracing::debug!("no state document; creating defaults");
                LoadOrigin::Created
            }
        };

        let state = AppState::default();
        self.save(&state)?;
        Ok(LoadOutcome { state, origin })
    }

    /// Serialize and overwrite the stored document
    fn save(&mut self, state: &AppState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)?;
        self.write(&json)?;
        tracing::debug!(tasks = state.tasks.len(), "saved state document");
        Ok(())
    }
}

/// Decode a stored document, backfilling missing parts with defaults.
///
/// Also returns how many tasks were given a new id, so the caller can
/// persist them.
pub fn decode_document(raw: &[u8]) -> std::result::Result<(AppState, usize), String> {
    let value: Value = serde_json::from_slice(raw).map_err(|err| err.to_string())?;
    let Some(map) = value.as_object() else {
        return Err("top-level value is not an object".to_string());
    };
    let parts = DocumentParts::from_object(map);
    let reassigned_ids = parts.reassigned_ids;
    Ok((
        parts.into_state(default_places, default_categories),
        reassigned_ids,
    ))
}

// =========================================================================
// Paths
// =========================================================================

/// Path manager for the data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Use an explicit directory, or the platform data directory
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        match data_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => default_data_dir().map(Self::new),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the state document
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(format!("{STATE_KEY}.json"))
    }

    /// Path to the default configuration file
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// File-backed store for the state document
    pub fn file_store(&self) -> FileStore {
        FileStore::new(self.state_file())
    }
}

/// Platform data directory (e.g. `~/.local/share/homekeep`)
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(Error::DataDirUnavailable)
}

// =========================================================================
// Stores
// =========================================================================

/// State document kept in a file, read and written under a lock
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStore {
    fn read(&mut self) -> Result<Option<Vec<u8>>> {
        lock::read_locked(&self.path, DEFAULT_LOCK_TIMEOUT_MS)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        lock::write_atomic_locked(&self.path, data, DEFAULT_LOCK_TIMEOUT_MS)
    }
}

/// In-process store.
///
/// Clones share the same slot, so a test can hand one clone to a repository
/// and inspect or reload through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Rc<RefCell<Option<Vec<u8>>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw document bytes already stored
    pub fn with_document(data: impl Into<Vec<u8>>) -> Self {
        let store = Self::default();
        store.document.replace(Some(data.into()));
        store
    }

    pub fn document(&self) -> Option<Vec<u8>> {
        self.document.borrow().clone()
    }

    /// Make every subsequent write fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl StateStore for MemoryStore {
    fn read(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.document.borrow().clone())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "storage unavailable",
            )));
        }
        self.document.replace(Some(data.to_vec()));
        Ok(())
    }
}

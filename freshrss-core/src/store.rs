//! Durable unit state: the flag set plus a key-value map of derived values.
//!
//! Persists a [`StateFile`] JSON document at `<state_dir>/unit-state.json`.
//! Every mutation is written through to the backend before it returns, using
//! the `.tmp` + rename pattern, so a crash never exposes a half-written file.
//! Writes that must be observed together go through [`UnitState::set_many`].

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CharmConfig;
use crate::error::{io_err, StateError};
use crate::types::{ConnectionConfig, DbScheme, Flag};

pub const STATE_FILE_NAME: &str = "unit-state.json";
pub const CONFIG_SNAPSHOT_KEY: &str = "config-snapshot";

/// On-disk unit state payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub flags: BTreeSet<Flag>,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            updated_at: Utc::now(),
            flags: BTreeSet::new(),
            values: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Where a [`StateFile`] lives between process runs.
pub trait StateBackend {
    fn load(&self) -> Result<StateFile, StateError>;
    fn save(&mut self, state: &StateFile) -> Result<(), StateError>;
}

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Backend for `<state_dir>/unit-state.json`.
    pub fn in_dir(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateBackend for FileBackend {
    /// Returns an empty state if the file does not yet exist.
    fn load(&self) -> Result<StateFile, StateError> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        serde_json::from_str(&contents).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&mut self, state: &StateFile) -> Result<(), StateError> {
        let Some(dir) = self.path.parent() else {
            return Err(io_err(
                &self.path,
                std::io::Error::other("invalid state file path"),
            ));
        };
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

/// In-process backend. Clones share the same storage, so a test can keep a
/// handle, drop the [`UnitState`], and reopen it to simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    stored: Option<StateFile>,
    saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }

    pub fn snapshot(&self) -> Option<StateFile> {
        self.inner.borrow().stored.clone()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<StateFile, StateError> {
        Ok(self.inner.borrow().stored.clone().unwrap_or_default())
    }

    fn save(&mut self, state: &StateFile) -> Result<(), StateError> {
        let mut inner = self.inner.borrow_mut();
        inner.stored = Some(state.clone());
        inner.saves += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UnitState
// ---------------------------------------------------------------------------

/// The unit's flag set and key-value store, write-through to a backend.
pub struct UnitState {
    file: StateFile,
    backend: Box<dyn StateBackend>,
}

impl std::fmt::Debug for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitState").field("file", &self.file).finish()
    }
}

impl UnitState {
    pub fn open(backend: Box<dyn StateBackend>) -> Result<Self, StateError> {
        let file = backend.load()?;
        Ok(Self { file, backend })
    }

    /// Open the file-backed state under `state_dir`.
    pub fn open_dir(state_dir: &Path) -> Result<Self, StateError> {
        Self::open(Box::new(FileBackend::in_dir(state_dir)))
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.file.updated_at
    }

    // -- flags --------------------------------------------------------------

    pub fn is_set(&self, flag: Flag) -> bool {
        self.file.flags.contains(&flag)
    }

    pub fn flags(&self) -> &BTreeSet<Flag> {
        &self.file.flags
    }

    /// Set `flag`. Returns `true` if it was not already set.
    pub fn set_flag(&mut self, flag: Flag) -> Result<bool, StateError> {
        if self.is_set(flag) {
            return Ok(false);
        }
        self.commit(|file| {
            file.flags.insert(flag);
        })?;
        tracing::info!(%flag, "flag set");
        Ok(true)
    }

    /// Clear `flag`. Returns `true` if it was set.
    pub fn clear_flag(&mut self, flag: Flag) -> Result<bool, StateError> {
        if !self.is_set(flag) {
            return Ok(false);
        }
        self.commit(|file| {
            file.flags.remove(&flag);
        })?;
        tracing::info!(%flag, "flag cleared");
        Ok(true)
    }

    // -- key-value ----------------------------------------------------------

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StateError> {
        self.file
            .values
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| StateError::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StateError> {
        let value = serde_json::to_value(value)?;
        self.set_many([(key, value)])
    }

    /// Write several keys in a single save.
    pub fn set_many<'k>(
        &mut self,
        entries: impl IntoIterator<Item = (&'k str, Value)>,
    ) -> Result<(), StateError> {
        let entries: Vec<_> = entries.into_iter().collect();
        self.commit(|file| {
            for (key, value) in entries {
                file.values.insert(key.to_string(), value);
            }
        })
    }

    // -- typed views ----------------------------------------------------------

    /// The acquired connection, if every field has been written.
    pub fn connection(&self) -> Result<Option<ConnectionConfig>, StateError> {
        let Some(scheme) = self.get::<DbScheme>(ConnectionConfig::SCHEME_KEY)? else {
            return Ok(None);
        };
        let field = |key: &str| self.get::<String>(key);
        let (Some(user), Some(password), Some(host), Some(base)) = (
            field(ConnectionConfig::USER_KEY)?,
            field(ConnectionConfig::PASSWORD_KEY)?,
            field(ConnectionConfig::HOST_KEY)?,
            field(ConnectionConfig::BASE_KEY)?,
        ) else {
            return Ok(None);
        };
        Ok(Some(ConnectionConfig {
            scheme,
            user,
            password,
            host,
            base,
        }))
    }

    pub fn set_connection(&mut self, connection: &ConnectionConfig) -> Result<(), StateError> {
        self.set_many(connection.entries())
    }

    pub fn config_snapshot(&self) -> Result<Option<CharmConfig>, StateError> {
        self.get(CONFIG_SNAPSHOT_KEY)
    }

    pub fn set_config_snapshot(&mut self, config: &CharmConfig) -> Result<(), StateError> {
        self.set(CONFIG_SNAPSHOT_KEY, config)
    }

    /// Apply `mutate` to a copy, persist it, then adopt it. A failed save
    /// leaves the in-memory state untouched.
    fn commit(&mut self, mutate: impl FnOnce(&mut StateFile)) -> Result<(), StateError> {
        let mut next = self.file.clone();
        mutate(&mut next);
        next.updated_at = Utc::now();
        self.backend.save(&next)?;
        self.file = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_state_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let state = UnitState::open_dir(tmp.path()).unwrap();
        assert!(state.flags().is_empty());
        assert!(state.connection().unwrap().is_none());
    }

    #[test]
    fn flags_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let mut state = UnitState::open_dir(tmp.path()).unwrap();
            assert!(state.set_flag(Flag::SystemInitialized).unwrap());
            assert!(!state.set_flag(Flag::SystemInitialized).unwrap());
        }
        let state = UnitState::open_dir(tmp.path()).unwrap();
        assert!(state.is_set(Flag::SystemInitialized));
        assert!(!state.is_set(Flag::Installed));
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let mut state = UnitState::open_dir(tmp.path()).unwrap();
        state.set("k", &"v").unwrap();
        let tmp_path = FileBackend::in_dir(tmp.path())
            .path()
            .with_extension("json.tmp");
        assert!(!tmp_path.exists(), "tmp file should be removed after atomic rename");
    }

    #[test]
    fn unchanged_flag_does_not_save() {
        let backend = MemoryBackend::new();
        let mut state = UnitState::open(Box::new(backend.clone())).unwrap();
        state.clear_flag(Flag::Ready).unwrap();
        assert_eq!(backend.save_count(), 0);
        state.set_flag(Flag::Ready).unwrap();
        state.set_flag(Flag::Ready).unwrap();
        assert_eq!(backend.save_count(), 1);
    }

    #[test]
    fn connection_is_written_in_one_save() {
        let backend = MemoryBackend::new();
        let mut state = UnitState::open(Box::new(backend.clone())).unwrap();
        let conn = ConnectionConfig::from_uri("pgsql://u:p@h/d").unwrap();

        state.set_connection(&conn).unwrap();

        assert_eq!(backend.save_count(), 1);
        assert_eq!(state.connection().unwrap(), Some(conn));
    }

    #[test]
    fn partial_connection_reads_as_absent() {
        let backend = MemoryBackend::new();
        let mut state = UnitState::open(Box::new(backend)).unwrap();
        state.set(ConnectionConfig::SCHEME_KEY, &"pgsql").unwrap();
        state.set(ConnectionConfig::USER_KEY, &"u").unwrap();
        assert!(state.connection().unwrap().is_none());
    }

    #[test]
    fn decode_error_names_the_key() {
        let backend = MemoryBackend::new();
        let mut state = UnitState::open(Box::new(backend)).unwrap();
        state.set(ConnectionConfig::SCHEME_KEY, &"oracle").unwrap();
        let err = state.connection().unwrap_err();
        assert!(err.to_string().contains("db-scheme"), "got: {err}");
    }
}

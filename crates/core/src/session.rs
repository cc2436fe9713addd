use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{config_dir, ConfigError};
use crate::connection::ConnectionDescriptor;

pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read session file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse session file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to create config directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize session: {source}")]
    Serialize {
        #[source]
        source: toml::ser::Error,
    },
    #[error("failed to write session file at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionState {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub last_connection: Option<ConnectionDescriptor>,
    #[serde(default)]
    pub history: Vec<ConnectionDescriptor>,
}

impl SessionState {
    /// Puts `connection` at the front of the history unless its target is
    /// already listed. Returns whether the history changed.
    pub fn remember(&mut self, connection: &ConnectionDescriptor, limit: usize) -> bool {
        if self
            .history
            .iter()
            .any(|known| known.same_target(connection))
        {
            return false;
        }
        self.history.insert(0, connection.clone());
        self.history.truncate(limit.max(1));
        true
    }

    fn dedupe_history(&mut self) {
        let mut distinct: Vec<ConnectionDescriptor> = Vec::with_capacity(self.history.len());
        for connection in self.history.drain(..) {
            if !distinct.iter().any(|known| known.same_target(&connection)) {
                distinct.push(connection);
            }
        }
        self.history = distinct;
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<SessionState, SessionStoreError>;
    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError>;
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn open_default() -> Result<Self, SessionStoreError> {
        Ok(Self::at_path(config_dir()?.join("session.toml")))
    }

    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<SessionState, SessionStoreError> {
        if !self.path.exists() {
            return Ok(SessionState::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| SessionStoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(SessionState::default());
        }

        let mut state: SessionState =
            toml::from_str(&raw).map_err(|source| SessionStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        state.dedupe_history();
        Ok(state)
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        if let Some(parent_dir) = self.path.parent() {
            fs::create_dir_all(parent_dir).map_err(|source| SessionStoreError::CreateDir {
                path: parent_dir.to_path_buf(),
                source,
            })?;
        }

        let rendered = toml::to_string_pretty(state)
            .map_err(|source| SessionStoreError::Serialize { source })?;
        fs::write(&self.path, rendered).map_err(|source| SessionStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: Mutex<SessionState>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(state: SessionState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionState, SessionStoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{
        FileSessionStore, MemorySessionStore, SessionState, SessionStore, SessionStoreError,
        HISTORY_LIMIT,
    };
    use crate::connection::{ConnectionDescriptor, DbKind};

    fn descriptor(database: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::new(DbKind::MySql, "127.0.0.1", "root", database).with_secret("pw")
    }

    #[test]
    fn remember_skips_known_targets_and_caps_length() {
        let mut state = SessionState::default();
        for index in 0..HISTORY_LIMIT + 3 {
            assert!(state.remember(&descriptor(&format!("db{index}")), HISTORY_LIMIT));
        }
        assert_eq!(state.history.len(), HISTORY_LIMIT);
        assert_eq!(state.history[0].database_name, "db12");

        let same_target = descriptor("db12").with_secret("other");
        assert!(!state.remember(&same_target, HISTORY_LIMIT));
        assert_eq!(state.history.len(), HISTORY_LIMIT);
    }

    #[test]
    fn missing_session_file_loads_empty_state() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store = FileSessionStore::at_path(temp_dir.path().join("session.toml"));

        let state = store.load().expect("missing file should load");
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn save_and_reload_round_trips_through_disk() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store = FileSessionStore::at_path(temp_dir.path().join("nested").join("session.toml"));

        let mut state = SessionState {
            connected: true,
            last_connection: Some(descriptor("shop")),
            history: Vec::new(),
        };
        state.remember(&descriptor("shop"), HISTORY_LIMIT);
        state.remember(
            &ConnectionDescriptor::new(DbKind::PostgreSql, "db.internal", "app", "billing"),
            HISTORY_LIMIT,
        );
        store.save(&state).expect("save should succeed");

        let reloaded = store.load().expect("reload should succeed");
        assert_eq!(reloaded, state);
        assert_eq!(reloaded.history[0].db_kind, DbKind::PostgreSql);
    }

    #[test]
    fn load_drops_duplicate_history_entries() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store = FileSessionStore::at_path(temp_dir.path().join("session.toml"));
        let state = SessionState {
            connected: false,
            last_connection: None,
            history: vec![descriptor("a"), descriptor("a"), descriptor("b")],
        };
        store.save(&state).expect("save should succeed");

        let reloaded = store.load().expect("reload should succeed");
        let names = reloaded
            .history
            .iter()
            .map(|connection| connection.database_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn configured_history_limit_survives_reload() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store = FileSessionStore::at_path(temp_dir.path().join("session.toml"));
        let limit = HISTORY_LIMIT + 5;

        let mut state = SessionState::default();
        for index in 0..limit {
            state.remember(&descriptor(&format!("db{index}")), limit);
        }
        store.save(&state).expect("save should succeed");

        let mut reloaded = store.load().expect("reload should succeed");
        assert_eq!(reloaded.history.len(), limit);
        assert!(reloaded.remember(&descriptor("fresh"), limit));
        assert_eq!(reloaded.history.len(), limit);
        assert_eq!(reloaded.history[0].database_name, "fresh");
    }

    #[test]
    fn corrupt_session_file_is_reported() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("session.toml");
        fs::write(&path, "connected = maybe").expect("failed to write session");

        let err = FileSessionStore::at_path(&path)
            .load()
            .expect_err("corrupt file should fail");
        assert!(matches!(err, SessionStoreError::Parse { .. }));
    }

    #[test]
    fn memory_store_returns_last_saved_state() {
        let store = MemorySessionStore::default();
        let state = SessionState {
            connected: true,
            last_connection: Some(descriptor("shop")),
            history: vec![descriptor("shop")],
        };
        store.save(&state).expect("save should succeed");
        assert_eq!(store.load().expect("load should succeed"), state);
    }
}

//! Persistence of the client's local view across sessions.
//!
//! The store is an opaque key-value map of JSON values. Anything unreadable
//! is treated as absent: a corrupt cache costs a re-sync, never a crash.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use noticeboard_types::models::{Cursor, Notice};

use crate::error::{SyncError, SyncResult};

pub const KEY_AUTHOR_NAME: &str = "authorName";
pub const KEY_NOTICES: &str = "notices";
pub const KEY_LAST_ROW_NUMBER: &str = "lastRowNumber";

/// Key-value storage for client state.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Write several keys as one unit.
    fn put_many(&self, entries: Vec<(&str, Value)>) -> SyncResult<()>;

    fn put(&self, key: &str, value: Value) -> SyncResult<()> {
        self.put_many(vec![(key, value)])
    }
}

impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn put_many(&self, entries: Vec<(&str, Value)>) -> SyncResult<()> {
        (**self).put_many(entries)
    }
}

/// In-memory store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    fn put_many(&self, entries: Vec<(&str, Value)>) -> SyncResult<()> {
        let mut values = self.values.lock();
        for (k, v) in entries {
            values.insert(k.to_string(), v);
        }
        Ok(())
    }
}

/// All keys kept in a single JSON document on disk.
///
/// Writes go to a sibling temp file which is then renamed over the
/// original, so a crash mid-write leaves the previous state intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_document(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_document(path: &Path) -> Map<String, Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No saved state at {}", path.display());
            return Map::new();
        }
        Err(e) => {
            warn!("Cannot read saved state at {}: {}", path.display(), e);
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!("Saved state at {} is corrupt; starting empty", path.display());
            Map::new()
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    fn put_many(&self, entries: Vec<(&str, Value)>) -> SyncResult<()> {
        let mut values = self.values.lock();
        let mut next = values.clone();
        for (k, v) in entries {
            next.insert(k.to_string(), v);
        }

        let bytes = serde_json::to_vec(&next).map_err(|e| SyncError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| SyncError::Storage(format!("{}: {}", self.path.display(), e)))?;

        // Only what reached the disk is visible
        *values = next;
        Ok(())
    }
}

/// Typed view over the three persisted values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub author_name: Option<String>,
    pub notices: Vec<Notice>,
    pub cursor: Cursor,
}

impl PersistedState {
    /// Read every key, dropping whatever fails to decode and any repeated ids.
    pub fn load(store: &impl StateStore) -> Self {
        let author_name = decode::<String>(store, KEY_AUTHOR_NAME)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let mut seen = HashSet::new();
        let notices = decode::<Vec<Notice>>(store, KEY_NOTICES)
            .unwrap_or_default()
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .collect();

        let cursor = decode::<Cursor>(store, KEY_LAST_ROW_NUMBER).unwrap_or_default();

        Self {
            author_name,
            notices,
            cursor,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(store: &impl StateStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring unreadable saved '{}': {}", key, e);
            None
        }
    }
}

/// Serialize the feed half of the state (cache and cursor).
pub fn feed_entries(notices: &[Notice], cursor: Cursor) -> SyncResult<Vec<(&'static str, Value)>> {
    let notices = serde_json::to_value(notices).map_err(|e| SyncError::Storage(e.to_string()))?;
    Ok(vec![
        (KEY_NOTICES, notices),
        (KEY_LAST_ROW_NUMBER, Value::from(cursor.0)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(id: &str) -> Notice {
        Notice {
            id: id.into(),
            author: "ann".into(),
            content: "hi".into(),
            timestamp: "2024-05-01 12:00:00".into(),
        }
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path);
        let mut entries = feed_entries(&[notice("a"), notice("b")], Cursor(7)).unwrap();
        entries.push((KEY_AUTHOR_NAME, Value::from("ann")));
        store.put_many(entries).unwrap();

        let reopened = FileStore::open(&path);
        let state = PersistedState::load(&reopened);
        assert_eq!(state.author_name.as_deref(), Some("ann"));
        assert_eq!(state.cursor, Cursor(7));
        assert_eq!(state.notices.len(), 2);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn failed_write_leaves_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStore::open(&path);
        store.put(KEY_LAST_ROW_NUMBER, Value::from(3)).unwrap();

        // A directory in place of the temp file makes the write fail
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        let err = store.put(KEY_LAST_ROW_NUMBER, Value::from(9)).unwrap_err();
        assert!(matches!(err, SyncError::Storage(_)));

        assert_eq!(store.get(KEY_LAST_ROW_NUMBER), Some(Value::from(3)));
        let on_disk = PersistedState::load(&FileStore::open(&path));
        assert_eq!(on_disk.cursor, Cursor(3));
    }

    #[test]
    fn corrupt_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let state = PersistedState::load(&FileStore::open(&path));
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = PersistedState::load(&FileStore::open(dir.path().join("absent.json")));
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn bad_key_does_not_poison_the_others() {
        let store = MemoryStore::new();
        store
            .put_many(vec![
                (KEY_NOTICES, Value::from("garbage")),
                (KEY_LAST_ROW_NUMBER, Value::from(12)),
                (KEY_AUTHOR_NAME, Value::from("  ")),
            ])
            .unwrap();

        let state = PersistedState::load(&store);
        assert!(state.notices.is_empty());
        assert_eq!(state.cursor, Cursor(12));
        assert_eq!(state.author_name, None);
    }

    #[test]
    fn repeated_ids_are_dropped_on_load() {
        let store = MemoryStore::new();
        store
            .put_many(feed_entries(&[notice("a"), notice("a"), notice("b")], Cursor(3)).unwrap())
            .unwrap();

        let ids: Vec<_> = PersistedState::load(&store)
            .notices
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }
}

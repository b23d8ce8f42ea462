//! Append-only JSON document store
//!
//! The on-disk layout is a TinyDB database with a single default table:
//!
//! ```json
//! {
//!     "_default": {
//!         "1": {
//!             "blob_url": "...",
//!             "commit_sha": "..."
//!         }
//!     }
//! }
//! ```
//!
//! Documents get consecutive integer ids. Every insert rewrites the file
//! (temp file + rename), indented with four spaces and with keys sorted.

use super::lock::StoreLock;
use crate::error::StoreError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Table every record is inserted into
pub const DEFAULT_TABLE: &str = "_default";

const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// A stored document; `BTreeMap` keeps its keys sorted on output
type Document = BTreeMap<String, Value>;
type Table = BTreeMap<String, Document>;
type Database = BTreeMap<String, Table>;

struct State {
    tables: Database,
    next_id: u64,
}

/// Result store backed by a single JSON file
///
/// Holds an exclusive lock on the file for its whole lifetime, so two runs
/// writing to the same organization's store are serialized.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<State>,
    _lock: StoreLock,
}

impl std::fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").field("path", &self.path).finish()
    }
}

impl JsonStore {
    /// Open the store at `path`, creating it and its directory if missing
    ///
    /// Existing documents are kept; new ones are numbered after them.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| open_failed(&path, e))?;
        }

        let lock = StoreLock::acquire(&path, LOCK_TIMEOUT)?;
        let tables = load(&path)?;
        let next_id = tables
            .values()
            .flat_map(|table| table.keys())
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let store = Self {
            path,
            state: Mutex::new(State { tables, next_id }),
            _lock: lock,
        };

        if !store.path.exists() {
            let state = store.lock_state()?;
            store.flush(&state.tables)?;
        }

        tracing::debug!(
            "Opened result store {} ({} existing records)",
            store.path.display(),
            store.len()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of documents in the default table
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.tables.get(DEFAULT_TABLE).map_or(0, Table::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `record` to the default table and persist, returning its id
    ///
    /// `record` must serialize to a JSON object.
    pub fn insert<T: Serialize>(&self, record: &T) -> Result<u64, StoreError> {
        let document: Document = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields.into_iter().collect(),
            Ok(other) => {
                return Err(self.write_failed(format!(
                    "documents must be JSON objects, got {}",
                    other
                )));
            }
            Err(e) => return Err(self.write_failed(e.to_string())),
        };

        let mut state = self.lock_state()?;
        let id = state.next_id;
        state
            .tables
            .entry(DEFAULT_TABLE.to_string())
            .or_default()
            .insert(id.to_string(), document);

        if let Err(e) = self.flush(&state.tables) {
            // Keep memory consistent with disk
            if let Some(table) = state.tables.get_mut(DEFAULT_TABLE) {
                table.remove(&id.to_string());
            }
            return Err(e);
        }

        state.next_id += 1;
        Ok(id)
    }

    /// All documents of the default table, in id order
    pub fn documents(&self) -> Result<Vec<(u64, Value)>, StoreError> {
        let state = self.lock_state()?;
        let mut documents: Vec<(u64, Value)> = state
            .tables
            .get(DEFAULT_TABLE)
            .into_iter()
            .flat_map(|table| table.iter())
            .filter_map(|(id, doc)| {
                let id = id.parse::<u64>().ok()?;
                let value = serde_json::to_value(doc).ok()?;
                Some((id, value))
            })
            .collect();
        documents.sort_by_key(|(id, _)| *id);
        Ok(documents)
    }

    /// Move an existing store at `path` aside as `results.json.<UTC timestamp>`
    ///
    /// Returns the new location, or `None` when there was nothing to rotate.
    pub fn rotate(path: &Path) -> Result<Option<PathBuf>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }

        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let mut name = path.as_os_str().to_os_string();
        name.push(format!(".{}", stamp));
        let rotated = PathBuf::from(name);

        fs::rename(path, &rotated).map_err(|e| StoreError::WriteFailed {
            path: path.display().to_string(),
            reason: format!("cannot rotate to {}: {}", rotated.display(), e),
        })?;

        tracing::info!("Rotated {} to {}", path.display(), rotated.display());
        Ok(Some(rotated))
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| self.write_failed("store state poisoned by a panicked writer".to_string()))
    }

    fn flush(&self, tables: &Database) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        tables
            .serialize(&mut serializer)
            .map_err(|e| self.write_failed(e.to_string()))?;

        let mut tmp = self.path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &buf).map_err(|e| self.write_failed(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.write_failed(e.to_string())
        })
    }

    fn write_failed(&self, reason: String) -> StoreError {
        StoreError::WriteFailed {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

fn open_failed(path: &Path, e: impl std::fmt::Display) -> StoreError {
    StoreError::OpenFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Read an existing store; a missing or blank file is an empty database
fn load(path: &Path) -> Result<Database, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Database::new()),
        Err(e) => return Err(open_failed(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(Database::new());
    }

    serde_json::from_str(&content).map_err(|e| {
        tracing::error!("Cannot parse result store {}: {}", path.display(), e);
        StoreError::Corrupted(path.display().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("org/results.json");

        let store = JsonStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_insert_layout_indent_and_sorted_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let store = JsonStore::open(&path).unwrap();

        let id = store.insert(&json!({"zeta": "z", "alpha": "a"})).unwrap();
        assert_eq!(id, 1);

        let content = fs::read_to_string(&path).unwrap();
        let expected = "{\n    \"_default\": {\n        \"1\": {\n            \"alpha\": \"a\",\n            \"zeta\": \"z\"\n        }\n    }\n}";
        assert_eq!(content, expected);
    }

    #[test]
    fn test_reopen_appends_after_existing_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");

        {
            let store = JsonStore::open(&path).unwrap();
            store.insert(&json!({"n": 1})).unwrap();
            store.insert(&json!({"n": 2})).unwrap();
        }

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.insert(&json!({"n": 1})).unwrap(), 3);

        let docs = store.documents().unwrap();
        let ids: Vec<u64> = docs.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // Identical content from a later run is kept, not deduplicated
        assert_eq!(docs[0].1, docs[2].1);
    }

    #[test]
    fn test_blank_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "").unwrap();

        let store = JsonStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupted_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("results.json")).unwrap();

        let err = store.insert(&"just a string").unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_rotate_moves_store_aside() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        assert_eq!(JsonStore::rotate(&path).unwrap(), None);

        {
            let store = JsonStore::open(&path).unwrap();
            store.insert(&json!({"n": 1})).unwrap();
        }

        let rotated = JsonStore::rotate(&path).unwrap().unwrap();
        assert!(!path.exists());
        assert!(rotated.exists());
        assert!(
            rotated
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("results.json.")
        );

        let store = JsonStore::open(&path).unwrap();
        assert!(store.is_empty());
    }
}

// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A single-file JSON key-value store.

use perfwatch_core::storage::KeyValueStore;
use perfwatch_core::{TelemetryError, TelemetryResult};
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Stores every key as a member of one JSON object on disk.
///
/// Writes go to a temporary file in the same directory which then atomically
/// replaces the target, so a crash mid-write never leaves a truncated store.
/// A missing file reads as an empty store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> TelemetryResult<Map<String, Value>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice(&bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(TelemetryError::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> TelemetryResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, map)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> TelemetryResult<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    fn put(&self, key: &str, value: Value) -> TelemetryResult<()> {
        self.put_all(vec![(key.to_string(), value)])
    }

    fn put_all(&self, entries: Vec<(String, Value)>) -> TelemetryResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| TelemetryError::Storage("Failed to acquire write lock".to_string()))?;
        let mut map = self.read_all()?;
        map.extend(entries);
        self.write_all(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert_eq!(store.get("performanceMetrics").unwrap(), None);
    }

    #[test]
    fn test_empty_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "\n").unwrap();
        assert_eq!(JsonFileStore::new(path).get("x").unwrap(), None);
    }

    #[test]
    fn test_put_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let store = JsonFileStore::new(&path);

        store.put("a", json!({"render:frame": []})).unwrap();
        store.put("b", json!(2)).unwrap();
        store.put("a", json!({})).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("a").unwrap(), Some(json!({})));
        assert_eq!(reopened.get("b").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(path);

        assert!(matches!(
            store.get("a"),
            Err(TelemetryError::Serialization(_))
        ));
        // Writes refuse to clobber a store they cannot read.
        assert!(store.put("a", json!(1)).is_err());
    }

    #[test]
    fn test_non_object_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            JsonFileStore::new(path).get("a"),
            Err(TelemetryError::Storage(_))
        ));
    }
}

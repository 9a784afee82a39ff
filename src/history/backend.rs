//! Persistence backends for the history store.
//!
//! A backend only loads and saves whole snapshots; capacity and ordering are
//! the store's business.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::history::record::HistoryRecord;

const FORMAT_VERSION: u32 = 1;

pub trait HistoryBackend: Send + Sync {
    fn load(&self) -> AppResult<Vec<HistoryRecord>>;

    /// Replace the persisted snapshot. Must be all-or-nothing.
    fn save(&self, records: &[HistoryRecord]) -> AppResult<()>;
}

#[derive(Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    records: Vec<HistoryRecord>,
}

/// JSON document on disk, replaced atomically via a sibling temp file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileBackend { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl HistoryBackend for JsonFileBackend {
    fn load(&self) -> AppResult<Vec<HistoryRecord>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Storage(format!("Failed to read {}: {}", self.path.display(), e))),
        };
        let file: HistoryFile = serde_json::from_str(&data)
            .map_err(|e| AppError::Storage(format!("Corrupt history file {}: {}", self.path.display(), e)))?;
        if file.version != FORMAT_VERSION {
            return Err(AppError::Storage(format!("Unsupported history format version {}", file.version)));
        }
        Ok(file.records)
    }

    fn save(&self, records: &[HistoryRecord]) -> AppResult<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;

        let body = serde_json::to_vec_pretty(&HistoryFile { version: FORMAT_VERSION, records: records.to_vec() })
            .map_err(|e| AppError::Storage(format!("Failed to encode history: {}", e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| AppError::Storage(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(&body)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| AppError::Storage(format!("Failed to write history: {}", e)))?;
        tmp.persist(&self.path)
            .map_err(|e| AppError::Storage(format!("Failed to replace {}: {}", self.path.display(), e.error)))?;
        Ok(())
    }
}

/// Process-local backend; nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> AppResult<Vec<HistoryRecord>> {
        let guard = self
            .records
            .lock()
            .map_err(|_| AppError::Storage("History lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, records: &[HistoryRecord]) -> AppResult<()> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| AppError::Storage("History lock poisoned".to_string()))?;
        *guard = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ProcessingParams;
    use chrono::{TimeZone, Utc};

    fn record(id: &str) -> HistoryRecord {
        HistoryRecord::new(id, "orig.png", "https://x/y.webp", "orig.png", Utc.timestamp_opt(1_700_000_000, 0).unwrap(), ProcessingParams::default())
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested/history.json"));
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_uses_camel_case_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/history.json");
        let backend = JsonFileBackend::new(&path);
        backend.save(&[record("a")]).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["records"][0]["resultImageRef"], "https://x/y.webp");
        assert_eq!(backend.load().unwrap(), vec![record("a")]);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileBackend::new(&path).load().unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}

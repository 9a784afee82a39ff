//! Capacity-bounded history of completed generations.
//!
//! Records are kept newest-first. Every mutation builds the next snapshot,
//! hands it to the backend, and only swaps it in once the save succeeded, so a
//! failed write leaves both memory and disk at the previous snapshot. Saves
//! run on the blocking pool so a disk flush never stalls a runtime worker.
use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::history::backend::HistoryBackend;
use crate::history::record::{newest_first, HistoryRecord};

pub const HISTORY_CAPACITY: usize = 20;

pub struct HistoryStore {
    backend: Arc<dyn HistoryBackend>,
    capacity: usize,
    records: Mutex<Vec<HistoryRecord>>,
}

impl HistoryStore {
    pub fn open(backend: Box<dyn HistoryBackend>) -> AppResult<Self> {
        Self::with_capacity(backend, HISTORY_CAPACITY)
    }

    /// Load the persisted snapshot, trimming it if it holds more than
    /// `capacity` records.
    pub fn with_capacity(backend: Box<dyn HistoryBackend>, capacity: usize) -> AppResult<Self> {
        let mut records = backend.load()?;
        newest_first(&mut records);
        let mut seen = HashSet::new();
        records.retain(|r| seen.insert(r.id.clone()));
        if records.len() > capacity {
            let dropped = records.len() - capacity;
            records.truncate(capacity);
            backend.save(&records)?;
            tracing::info!(dropped, capacity, "Trimmed over-capacity history on open");
        }
        Ok(HistoryStore {
            backend: Arc::from(backend),
            capacity,
            records: Mutex::new(records),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert `record`, evicting the oldest entries beyond capacity. Returns
    /// the ids of evicted records.
    pub async fn add(&self, record: HistoryRecord) -> AppResult<Vec<String>> {
        let mut guard = self.records.lock().await;
        if guard.iter().any(|r| r.id == record.id) {
            return Err(AppError::DuplicateKey(record.id));
        }

        let mut next = guard.clone();
        let id = record.id.clone();
        next.push(record);
        newest_first(&mut next);
        let evicted: Vec<String> = if next.len() > self.capacity {
            next.split_off(self.capacity).into_iter().map(|r| r.id).collect()
        } else {
            Vec::new()
        };

        *guard = self.persist(next).await?;
        tracing::debug!(%id, evicted = evicted.len(), "History record added");
        Ok(evicted)
    }

    /// All records, newest first.
    pub async fn list(&self) -> Vec<HistoryRecord> {
        self.records.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<HistoryRecord> {
        self.records.lock().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Remove `id` if present. Absent ids are not an error.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut guard = self.records.lock().await;
        if !guard.iter().any(|r| r.id == id) {
            return Ok(false);
        }
        let next: Vec<HistoryRecord> = guard.iter().filter(|r| r.id != id).cloned().collect();
        *guard = self.persist(next).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> AppResult<()> {
        let mut guard = self.records.lock().await;
        *guard = self.persist(Vec::new()).await?;
        Ok(())
    }

    /// Save `next` off the async workers and hand it back once it is durable.
    async fn persist(&self, next: Vec<HistoryRecord>) -> AppResult<Vec<HistoryRecord>> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.save(&next).map(|_| next))
            .await
            .map_err(|e| AppError::Storage(format!("History save task failed: {}", e)))?
    }
}

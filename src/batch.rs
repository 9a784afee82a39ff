//! Batch processing: one job task per image, results collected in order.
//!
//! Each task runs and (on success) records its own job, then returns
//! a [`BatchOutcome`]; nothing is written into a shared result list. With a
//! concurrency of 1 the batch is strictly sequential.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::credential::Credential;
use crate::error::{AppError, AppResult};
use crate::history::{HistoryRecord, HistoryStore};
use crate::image::ImagePayload;
use crate::orchestrator::JobOrchestrator;
use crate::prompt::{ProcessingParams, PromptComposer};

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: String,
    pub filename: String,
    /// What the history entry points back to: a path, URL or the data URL.
    pub original_ref: String,
    pub image: ImagePayload,
}

impl BatchItem {
    pub fn new(filename: impl Into<String>, original_ref: impl Into<String>, image: ImagePayload) -> Self {
        BatchItem {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.into(),
            original_ref: original_ref.into(),
            image,
        }
    }

    /// Read an image file; the filename and path become the history references.
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let image = ImagePayload::from_path(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(BatchItem::new(filename, path.display().to_string(), image))
    }
}

/// Load every readable file in order. Unreadable files are returned next to
/// the items instead of aborting the rest.
pub async fn load_items(paths: &[PathBuf]) -> (Vec<BatchItem>, Vec<(PathBuf, AppError)>) {
    let mut items = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();
    for path in paths {
        match BatchItem::from_path(path).await {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable image");
                skipped.push((path.clone(), e));
            }
        }
    }
    (items, skipped)
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub id: String,
    pub filename: String,
    pub result: AppResult<String>,
    /// Set when the job succeeded but recording it failed.
    pub history_error: Option<AppError>,
}

pub struct BatchDriver {
    orchestrator: Arc<JobOrchestrator>,
    history: Option<Arc<HistoryStore>>,
    concurrency: usize,
}

impl BatchDriver {
    pub fn new(orchestrator: Arc<JobOrchestrator>, history: Option<Arc<HistoryStore>>) -> Self {
        BatchDriver { orchestrator, history, concurrency: 1 }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Process `items` with the same parameters. The output has one entry per
    /// input, in input order.
    pub async fn run(
        &self,
        items: Vec<BatchItem>,
        params: &ProcessingParams,
        credential: Option<&Credential>,
        cancel: &CancellationToken,
    ) -> Vec<BatchOutcome> {
        let total = items.len();
        tracing::info!(total, concurrency = self.concurrency, style = params.style.key(), "Starting batch");
        let template = PromptComposer::new().compose(params);
        let template = &template;

        let outcomes: Vec<BatchOutcome> = stream::iter(items)
            .map(move |item| async move {
                let created_at = Utc::now();
                let result = self.orchestrator.run(&item.image, template, credential, cancel).await;
                let history_error = match (&result, &self.history) {
                    (Ok(url), Some(history)) => {
                        let record = HistoryRecord::new(
                            item.id.clone(),
                            item.original_ref.clone(),
                            url.clone(),
                            item.filename.clone(),
                            created_at,
                            *params,
                        );
                        record_best_effort(history, record).await
                    }
                    _ => None,
                };
                if let Err(e) = &result {
                    tracing::warn!(id = %item.id, filename = %item.filename, error = %e, "Image failed");
                }
                BatchOutcome { id: item.id, filename: item.filename, result, history_error }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        tracing::info!(total, succeeded, "Batch finished");
        outcomes
    }
}

/// A failed history write never invalidates the generation; it is logged and
/// handed back to the caller.
pub async fn record_best_effort(history: &HistoryStore, record: HistoryRecord) -> Option<AppError> {
    let id = record.id.clone();
    match history.add(record).await {
        Ok(evicted) => {
            if !evicted.is_empty() {
                tracing::debug!(%id, ?evicted, "Evicted old history records");
            }
            None
        }
        Err(e) => {
            tracing::warn!(%id, error = %e, "Failed to save history record");
            Some(e)
        }
    }
}

//! Line Sketch library
//!
//! Turns photos into line art through Replicate predictions and keeps a small
//! local history of results.
//!
//! Modules:
//! - `prompt`: Style profile table and the prompt composer.
//! - `replicate`: Thin client for the predictions API and the `PredictionApi` seam.
//! - `orchestrator`: Submit, poll and extract one remote job under a deadline.
//! - `history`: Capacity-bounded, persisted history of completed results.
//! - `batch`: Per-image job tasks collected into an ordered result list.
//! - `api`: Axum HTTP handlers and router used by the server binary.
//! - `config`: Env-driven configuration loader.
//! - `credential`, `image`: Input types handed in by callers.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `ReplicateClient`,
//! `PromptComposer`, `JobOrchestrator` and `HistoryStore`.
pub mod api;
pub mod batch;
pub mod config;
pub mod credential;
pub mod error;
pub mod history;
pub mod image;
pub mod orchestrator;
pub mod prompt;
pub mod replicate;

pub use config::Config;
pub use credential::Credential;
pub use error::{AppError, AppResult};
pub use history::HistoryStore;
pub use image::ImagePayload;
pub use orchestrator::JobOrchestrator;
pub use prompt::PromptComposer;
pub use replicate::ReplicateClient;

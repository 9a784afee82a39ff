//! Common error type and alias.
//!
//! Every fallible operation in the crate returns [`AppResult`]. Variants map
//! one-to-one onto the failure categories a caller needs to tell apart when
//! deciding whether to retry or how to word a message.
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input; nothing was sent over the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Submission or status query could not reach the service or got a non-2xx.
    #[error("Transport error (status {}): {body}", fmt_status(.status))]
    Transport { status: Option<u16>, body: String },

    /// The remote job itself reported failure.
    #[error("Remote job failed: {detail}")]
    RemoteFailure { detail: String },

    /// The remote job succeeded but returned nothing usable.
    #[error("Job {job_id} succeeded without output")]
    MissingOutput { job_id: String },

    #[error("Job timed out after {attempts} status checks")]
    TimedOut { attempts: u32 },

    #[error("Job cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("History record '{0}' already exists")]
    DuplicateKey(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string())
}

/// Coarse grouping used for user-facing messages and HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Transport,
    Remote,
    Timeout,
    Cancelled,
    Storage,
    Conflict,
    Config,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Remote => "remote",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Storage => "storage",
            Self::Conflict => "conflict",
            Self::Config => "config",
        }
    }
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Validation(_) => ErrorCategory::Validation,
            AppError::Transport { .. } => ErrorCategory::Transport,
            AppError::RemoteFailure { .. } | AppError::MissingOutput { .. } => ErrorCategory::Remote,
            AppError::TimedOut { .. } => ErrorCategory::Timeout,
            AppError::Cancelled => ErrorCategory::Cancelled,
            AppError::Storage(_) => ErrorCategory::Storage,
            AppError::DuplicateKey(_) => ErrorCategory::Conflict,
            AppError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Only transport failures and timeouts are worth resubmitting unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transport { .. } | AppError::TimedOut { .. })
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "The request is missing required input",
            ErrorCategory::Transport => "Could not reach the image service. Please try again",
            ErrorCategory::Remote => "Image processing failed",
            ErrorCategory::Timeout => "Processing timeout. Please try again",
            ErrorCategory::Cancelled => "Processing was cancelled",
            ErrorCategory::Storage => "Could not access the local history",
            ErrorCategory::Conflict => "This result is already in the history",
            ErrorCategory::Config => "The service is misconfigured",
        }
    }

    /// The detail string to show next to [`user_message`](Self::user_message).
    pub fn detail(&self) -> String {
        match self {
            AppError::Transport { body, .. } => body.clone(),
            AppError::RemoteFailure { detail } => detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

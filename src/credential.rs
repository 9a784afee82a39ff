//! API token handling.
use std::fmt;

use crate::error::{AppError, AppResult};

/// Prefix carried by Replicate API tokens.
pub const TOKEN_PREFIX: &str = "r8_";

/// A Replicate API token. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Credential(trimmed.to_string()))
        }
    }

    /// Caller-supplied credential wins over the process default.
    pub fn resolve(caller: Option<&Credential>, default: Option<&Credential>) -> AppResult<Credential> {
        caller
            .or(default)
            .cloned()
            .ok_or_else(|| AppError::Validation("Replicate API key is required".to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn has_expected_prefix(&self) -> bool {
        self.0.starts_with(TOKEN_PREFIX)
    }

    pub fn masked(&self) -> String {
        let head: String = self.0.chars().take(4).collect();
        format!("{}****", head)
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

//! Env-driven configuration for the service, CLI and library.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults match the hosted Replicate API and a 5 s x 60
//! polling budget.
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::credential::Credential;
use crate::error::{AppError, AppResult};
use crate::orchestrator::PollPolicy;

pub const DEFAULT_API_URL: &str = "https://api.replicate.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub replicate_api_url: String,
    pub replicate_api_token: Option<String>,
    pub history_path: String,
    pub api_host: String,
    pub api_port: String,
    pub poll_interval_secs: u64,
    pub poll_max_attempts: u32,
    pub poll_query_retries: u32,
    pub batch_concurrency: usize,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> AppResult<Self> {
        Ok(Config {
            replicate_api_url: env::var("REPLICATE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            replicate_api_token: env::var("REPLICATE_API_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            history_path: env::var("HISTORY_PATH").unwrap_or_else(|_| "./data/history.json".to_string()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8190".to_string()),
            poll_interval_secs: parse_var("POLL_INTERVAL_SECS", 5)?,
            poll_max_attempts: parse_var("POLL_MAX_ATTEMPTS", 60)?,
            poll_query_retries: parse_var("POLL_QUERY_RETRIES", 0)?,
            batch_concurrency: parse_var("BATCH_CONCURRENCY", 1)?,
        })
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.poll_max_attempts,
            query_retries: self.poll_query_retries,
        }
    }

    /// The process-level default credential, if one is configured.
    pub fn default_credential(&self) -> Option<Credential> {
        self.replicate_api_token.as_deref().and_then(Credential::new)
    }

    pub fn print_env_vars() {
        let token = env::var("REPLICATE_API_TOKEN")
            .ok()
            .and_then(|t| Credential::new(&t))
            .map(|c| c.masked())
            .unwrap_or_else(|| "<unset>".to_string());
        println!("REPLICATE_API_URL: {}", env::var("REPLICATE_API_URL").unwrap_or_else(|_| "<unset>".to_string()));
        println!("REPLICATE_API_TOKEN: {}", token);
        println!("HISTORY_PATH: {}", env::var("HISTORY_PATH").unwrap_or_else(|_| "<unset>".to_string()));
        println!("API_HOST: {}", env::var("API_HOST").unwrap_or_else(|_| "<unset>".to_string()));
        println!("API_PORT: {}", env::var("API_PORT").unwrap_or_else(|_| "<unset>".to_string()));
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_and_rejects_garbage() {
        env::remove_var("LINE_SKETCH_TEST_UNSET");
        assert_eq!(parse_var::<u32>("LINE_SKETCH_TEST_UNSET", 7).unwrap(), 7);

        env::set_var("LINE_SKETCH_TEST_BAD", "five");
        let err = parse_var::<u32>("LINE_SKETCH_TEST_BAD", 5).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        env::set_var("LINE_SKETCH_TEST_GOOD", " 12 ");
        assert_eq!(parse_var::<u64>("LINE_SKETCH_TEST_GOOD", 5).unwrap(), 12);
    }
}

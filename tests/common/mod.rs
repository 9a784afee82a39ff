//! Scripted stand-in for the Replicate API shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use line_sketch::credential::Credential;
use line_sketch::error::{AppError, AppResult};
use line_sketch::history::HistoryRecord;
use line_sketch::prompt::{GenerationRequest, ProcessingParams};
use line_sketch::replicate::{Prediction, PredictionApi, PredictionStatus};

pub fn prediction(id: &str, status: PredictionStatus) -> Prediction {
    Prediction { id: id.to_string(), status, output: None, error: None }
}

pub fn succeeded(id: &str, urls: &[&str]) -> Prediction {
    Prediction { output: Some(json!(urls)), ..prediction(id, PredictionStatus::Succeeded) }
}

pub fn failed(id: &str, error: &str) -> Prediction {
    Prediction { error: Some(json!(error)), ..prediction(id, PredictionStatus::Failed) }
}

/// Replays scripted create/poll responses. Once the poll script runs dry the
/// job reports `processing` forever.
#[derive(Default)]
pub struct FakeApi {
    creates: Mutex<VecDeque<AppResult<Prediction>>>,
    polls: Mutex<VecDeque<AppResult<Prediction>>>,
    pub create_calls: AtomicU32,
    pub get_calls: AtomicU32,
    pub cancel_calls: AtomicU32,
    pub requests: Mutex<Vec<GenerationRequest>>,
    pub credentials: Mutex<Vec<String>>,
    pub token_valid: bool,
}

impl FakeApi {
    pub fn new() -> Self {
        FakeApi { token_valid: true, ..Default::default() }
    }

    pub fn push_create(&self, response: AppResult<Prediction>) -> &Self {
        self.creates.lock().unwrap().push_back(response);
        self
    }

    pub fn push_poll(&self, response: AppResult<Prediction>) -> &Self {
        self.polls.lock().unwrap().push_back(response);
        self
    }

    /// `n` processing polls followed by `last`.
    pub fn processing_then(&self, n: usize, last: Prediction) -> &Self {
        for _ in 0..n {
            self.push_poll(Ok(prediction(&last.id, PredictionStatus::Processing)));
        }
        self.push_poll(Ok(last))
    }

    pub fn gets(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionApi for FakeApi {
    async fn create_prediction(&self, credential: &Credential, request: &GenerationRequest) -> AppResult<Prediction> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        self.credentials.lock().unwrap().push(credential.expose().to_string());
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(prediction(&format!("pred-{}", n), PredictionStatus::Starting)))
    }

    async fn get_prediction(&self, _credential: &Credential, id: &str) -> AppResult<Prediction> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(prediction(id, PredictionStatus::Processing)))
    }

    async fn cancel_prediction(&self, _credential: &Credential, _id: &str) -> AppResult<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify_credential(&self, _credential: &Credential) -> AppResult<bool> {
        Ok(self.token_valid)
    }
}

pub fn transport(status: u16, body: &str) -> AppError {
    AppError::Transport { status: Some(status), body: body.to_string() }
}

pub fn token() -> Credential {
    Credential::new("r8_test_token").unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn record(id: &str, secs: i64) -> HistoryRecord {
    HistoryRecord::new(
        id,
        format!("/photos/{}.png", id),
        format!("https://replicate.delivery/{}.webp", id),
        format!("{}.png", id),
        at(secs),
        ProcessingParams::default(),
    )
}

//! Axum request handlers for the HTTP API.
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::response::json_body;
use crate::api::routes::AppState;
use crate::batch::record_best_effort;
use crate::credential::Credential;
use crate::error::AppResult;
use crate::history::HistoryRecord;
use crate::image::ImagePayload;
use crate::prompt::{ProcessingParams, RequestTemplate};

pub const API_KEY_HEADER: &str = "x-replicate-api-key";

pub async fn root() -> &'static str {
    "Line Sketch API"
}

fn header_credential(headers: &HeaderMap) -> Option<Credential> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(Credential::new)
}

pub async fn styles(State(state): State<Arc<AppState>>) -> Json<Value> {
    let styles: Vec<Value> = state
        .composer
        .styles()
        .iter()
        .map(|p| {
            json!({
                "style": p.style.key(),
                "modelVersion": p.model_version,
                "params": p.params,
            })
        })
        .collect();
    Json(Value::Array(styles))
}

pub async fn compose(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessingParams>, JsonRejection>,
) -> AppResult<Json<RequestTemplate>> {
    let params = json_body(payload)?;
    Ok(Json(state.composer.compose(&params)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub image_data_url: Option<String>,
    #[serde(default)]
    pub params: ProcessingParams,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub id: String,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_error: Option<String>,
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Json<GenerateResponse>> {
    let payload = json_body(payload)?;
    let data_url = payload.image_data_url.unwrap_or_default();
    let image = ImagePayload::from_data_url(&data_url)?;
    let credential = header_credential(&headers);
    let id = payload.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let filename = payload.filename.unwrap_or_else(|| format!("{}.png", id));
    let created_at = Utc::now();

    let cancel = state.shutdown.child_token();
    let output = state
        .orchestrator
        .generate(&image, &payload.params, credential.as_ref(), &cancel)
        .await
        .map_err(|e| {
            tracing::error!(%id, error = %e, "Generation failed");
            e
        })?;

    let record = HistoryRecord::new(id.clone(), data_url, output.clone(), filename, created_at, payload.params);
    let history_error = record_best_effort(&state.history, record).await.map(|e| e.to_string());

    Ok(Json(GenerateResponse { success: true, id, output, history_error }))
}

pub async fn list_history(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryRecord>> {
    Json(state.history.list().await)
}

pub async fn get_history_item(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.history.get(&id).await {
        Some(record) => Json(record).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": format!("History record '{}' not found", id)}))).into_response(),
    }
}

pub async fn delete_history_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let removed = state.history.delete(&id).await?;
    Ok(Json(json!({"status": "success", "removed": removed})))
}

pub async fn clear_history(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    state.history.clear().await?;
    Ok(Json(json!({"status": "success"})))
}

pub async fn verify_token(State(state): State<Arc<AppState>>, headers: HeaderMap) -> AppResult<Json<Value>> {
    let caller = header_credential(&headers);
    let credential = Credential::resolve(caller.as_ref(), state.orchestrator.default_credential())?;
    let valid = state.orchestrator.api().verify_credential(&credential).await?;
    if !credential.has_expected_prefix() {
        tracing::warn!(token = %credential.masked(), "API token does not start with the expected prefix");
    }
    Ok(Json(json!({"valid": valid, "formatOk": credential.has_expected_prefix()})))
}

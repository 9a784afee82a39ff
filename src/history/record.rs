use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompt::ProcessingParams;

/// One completed generation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub original_image_ref: String,
    pub result_image_ref: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub params: ProcessingParams,
}

impl HistoryRecord {
    pub fn new(
        id: impl Into<String>,
        original_image_ref: impl Into<String>,
        result_image_ref: impl Into<String>,
        filename: impl Into<String>,
        created_at: DateTime<Utc>,
        params: ProcessingParams,
    ) -> Self {
        HistoryRecord {
            id: id.into(),
            original_image_ref: original_image_ref.into(),
            result_image_ref: result_image_ref.into(),
            filename: filename.into(),
            created_at,
            params,
        }
    }
}

/// Newest first; ties broken by id so the order is total.
pub(crate) fn newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

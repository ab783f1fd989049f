//! Request and response bodies for the generation backend.
//!
//! Mirrors the JSON shapes of `POST /api/generate-video` and
//! `GET /api/status/{job_id}`.

use serde::{Deserialize, Serialize};

use crate::types::JobId;

// ---------------------------------------------------------------------------
// Wire status values
// ---------------------------------------------------------------------------

/// The job is still rendering.
pub const STATUS_PROCESSING: &str = "processing";
/// The job finished and `video_url` is set.
pub const STATUS_COMPLETED: &str = "completed";
/// The backend gave up on the job; `message` says why.
pub const STATUS_ERROR: &str = "error";

/// The three status values the backend is allowed to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Processing,
    Completed,
    Error,
}

impl StatusKind {
    /// Map a raw wire value to a known kind. Unknown values return `None`
    /// and must be treated as a protocol violation by the caller.
    pub fn classify(raw: &str) -> Option<Self> {
        match raw {
            STATUS_PROCESSING => Some(StatusKind::Processing),
            STATUS_COMPLETED => Some(StatusKind::Completed),
            STATUS_ERROR => Some(StatusKind::Error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/generate-video`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub prompt: String,
}

/// Success body of `POST /api/generate-video`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    /// Echoed initial status; informational only.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /api/status/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub job_id: Option<JobId>,
    pub status: String,
    #[serde(default)]
    pub message: String,
    /// Only set when `status` is `completed`.
    #[serde(default)]
    pub video_url: Option<String>,
}

impl StatusResponse {
    pub fn kind(&self) -> Option<StatusKind> {
        StatusKind::classify(&self.status)
    }
}

/// Best-effort failure body.
///
/// The backend raises FastAPI-style `{"detail": "..."}` errors; `message`
/// and `error` are accepted too.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Extract a human-readable message from a raw failure body, falling
    /// back to one derived from the status code.
    pub fn message_from(body: &str, status: u16) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| fallback_message(status))
    }

    fn into_message(self) -> Option<String> {
        let detail = self.detail.and_then(|d| match d {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            // Validation errors arrive as a list of objects.
            other => Some(other.to_string()),
        });
        let readable = |m: &String| !m.trim().is_empty();
        detail
            .filter(readable)
            .or_else(|| self.message.filter(readable))
            .or_else(|| self.error.filter(readable))
    }
}

/// Message used when the failure body carries nothing readable.
pub fn fallback_message(status: u16) -> String {
    format!("HTTP error, status: {status}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

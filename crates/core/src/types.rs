//! Job identity, lifecycle state, and the job record itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::progress::{ProgressEstimator, PROGRESS_COMPLETE, PROGRESS_INITIAL};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Status text shown as soon as the backend accepts a submission, before
/// the first real poll comes back.
pub const ACCEPTED_MESSAGE: &str = "Started video generation";

/// Status text shown once the backend reports completion.
pub const COMPLETED_MESSAGE: &str = "Video generation completed";

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// Opaque job identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Lifecycle state of the controller's job slot.
///
/// `Idle -> Submitting -> Processing -> {Completed | Failed}`, and back to
/// `Idle` only through an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Submitting,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    /// `Completed` and `Failed` stay put until the job is reset.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// A request is outstanding or polling is running.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Submitting | JobState::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Submitting => "submitting",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A single generation job as tracked by the client.
///
/// Created only once the backend has assigned an id. `id` and `prompt`
/// never change afterwards; everything else is driven by status ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub prompt: String,
    pub state: JobState,
    /// Synthetic progress in `0..=100`.
    pub progress: u8,
    pub last_message: String,
    /// Present only once the job has completed.
    pub result_url: Option<String>,
    pub submitted_at: Timestamp,
}

impl Job {
    /// A job the backend has just accepted. Progress is pre-seeded so the
    /// user sees movement before the first poll.
    pub fn accepted(id: JobId, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            state: JobState::Processing,
            progress: PROGRESS_INITIAL,
            last_message: ACCEPTED_MESSAGE.to_string(),
            result_url: None,
            submitted_at: chrono::Utc::now(),
        }
    }

    /// Apply a `processing` tick. Ignored once the job is terminal.
    pub fn apply_processing(&mut self, message: impl Into<String>) {
        if self.state != JobState::Processing {
            return;
        }
        self.progress = ProgressEstimator::next(self.progress);
        self.last_message = message.into();
    }

    /// Mark the job completed. Progress jumps straight to 100.
    pub fn complete(&mut self, result_url: Option<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Completed;
        self.progress = PROGRESS_COMPLETE;
        self.last_message = COMPLETED_MESSAGE.to_string();
        self.result_url = result_url;
    }

    /// Mark the job failed. Progress is left where it was.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Failed;
        self.last_message = message.into();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

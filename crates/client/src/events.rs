//! Events broadcast by the job controller.
//!
//! The presentation layer subscribes to these instead of the controller
//! reaching into any view. Sending with no subscribers is not an error.

use serde::Serialize;
use vidgen_core::types::{JobId, JobState};

/// A change in the controller's job slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// The slot moved to a new lifecycle state.
    StateChanged {
        job_id: Option<JobId>,
        state: JobState,
    },

    /// New progress and status text for a processing job.
    Progress {
        job_id: JobId,
        /// Synthetic percentage (0-100).
        progress: u8,
        message: String,
    },

    /// The job finished.
    Completed {
        job_id: JobId,
        result_url: Option<String>,
    },

    /// The job failed; `progress` is where it stopped.
    Failed {
        job_id: JobId,
        progress: u8,
        message: String,
    },

    /// The submission request itself failed; no job was created.
    SubmissionFailed { message: String },
}

impl JobEvent {
    /// Job this event refers to, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            JobEvent::StateChanged { job_id, .. } => job_id.as_ref(),
            JobEvent::Progress { job_id, .. }
            | JobEvent::Completed { job_id, .. }
            | JobEvent::Failed { job_id, .. } => Some(job_id),
            JobEvent::SubmissionFailed { .. } => None,
        }
    }
}

//! The transport seam between [`JobController`](crate::JobController) and
//! the backend.

use async_trait::async_trait;
use vidgen_core::status::StatusResponse;
use vidgen_core::types::JobId;

use crate::api::{ApiError, VideoApi};

/// Operations the job controller needs from a generation backend.
///
/// [`VideoApi`] is the production implementation; anything else that can
/// start a job and report its status can stand in for it.
#[async_trait]
pub trait JobBackend: Send + Sync + 'static {
    /// Start a job for an already-validated prompt.
    async fn submit(&self, prompt: &str) -> Result<JobId, ApiError>;

    /// Query the status of a previously started job.
    async fn status(&self, job_id: &JobId) -> Result<StatusResponse, ApiError>;
}

#[async_trait]
impl JobBackend for VideoApi {
    async fn submit(&self, prompt: &str) -> Result<JobId, ApiError> {
        VideoApi::submit(self, prompt)
            .await
            .map(|response| response.job_id)
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusResponse, ApiError> {
        VideoApi::status(self, job_id).await
    }
}

use std::fmt;

use vidgen_core::error::ValidationError;

use crate::api::ApiError;

/// Message used when the backend reports `error` without saying why.
pub const GENERIC_BACKEND_ERROR: &str = "Video generation failed";

/// Which request a transport failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submit,
    Poll,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Submit => f.write_str("generate video"),
            Stage::Poll => f.write_str("get status"),
        }
    }
}

/// Everything that can end a job, or prevent one from starting.
///
/// The `Display` text is what the presentation layer shows the user.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The prompt was rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A request failed or came back with a non-success status.
    #[error("Failed to {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: ApiError,
    },

    /// The backend reported a status value outside the known set.
    #[error("Unexpected job status '{status}'")]
    Protocol { status: String },

    /// The backend reported `status: "error"`. Shown verbatim.
    #[error("{0}")]
    BackendReported(String),

    /// The configured poll budget ran out before a terminal status.
    #[error("Gave up after {attempts} status checks")]
    PollLimitExceeded { attempts: u32 },

    /// A reset or a newer submission replaced this one while it was in flight.
    #[error("Submission was abandoned before the backend answered")]
    Superseded,
}

impl JobError {
    pub fn submit(source: ApiError) -> Self {
        JobError::Transport {
            stage: Stage::Submit,
            source,
        }
    }

    pub fn poll(source: ApiError) -> Self {
        JobError::Transport {
            stage: Stage::Poll,
            source,
        }
    }

    pub fn backend_reported(message: &str) -> Self {
        let message = message.trim();
        if message.is_empty() {
            JobError::BackendReported(GENERIC_BACKEND_ERROR.to_string())
        } else {
            JobError::BackendReported(message.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_messages_name_the_stage() {
        let err = JobError::submit(ApiError::Status {
            status: 400,
            message: "Prompt is required".into(),
        });
        assert_eq!(err.to_string(), "Failed to generate video: Prompt is required");

        let err = JobError::poll(ApiError::Status {
            status: 404,
            message: "HTTP error, status: 404".into(),
        });
        assert_eq!(err.to_string(), "Failed to get status: HTTP error, status: 404");
    }

    #[test]
    fn backend_message_is_verbatim() {
        let err = JobError::backend_reported("Error in Video Generation: CUDA OOM");
        assert_eq!(err.to_string(), "Error in Video Generation: CUDA OOM");
    }

    #[test]
    fn blank_backend_message_gets_generic_text() {
        assert_eq!(JobError::backend_reported("  ").to_string(), GENERIC_BACKEND_ERROR);
    }

    #[test]
    fn validation_is_transparent() {
        let err: JobError = ValidationError::Empty.into();
        assert_eq!(err.to_string(), "Please enter a prompt");
    }
}

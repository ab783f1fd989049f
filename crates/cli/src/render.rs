//! Text rendering of job events for the terminal.

use vidgen_client::JobEvent;
use vidgen_core::types::JobState;

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 20;

/// Render a `[####------]` bar for `progress` percent.
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (usize::from(progress.min(100)) * width) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// One line of output for an event, or `None` for events that are not
/// worth showing.
pub fn render_event(event: &JobEvent) -> Option<String> {
    match event {
        JobEvent::StateChanged {
            state: JobState::Submitting,
            ..
        } => Some("Submitting prompt...".to_string()),
        JobEvent::StateChanged {
            job_id: Some(job_id),
            state: JobState::Processing,
        } => Some(format!("Job {job_id} accepted")),
        JobEvent::StateChanged { .. } => None,
        JobEvent::Progress {
            progress, message, ..
        } => Some(format!(
            "{} {progress:>3}% {message}",
            progress_bar(*progress, BAR_WIDTH)
        )),
        JobEvent::Completed { job_id, .. } => Some(format!("Job {job_id} completed")),
        JobEvent::Failed {
            job_id, message, ..
        } => Some(format!("Job {job_id} failed: {message}")),
        JobEvent::SubmissionFailed { message } => Some(message.clone()),
    }
}

/// Render an event as a single JSON line.
pub fn render_event_json(event: &JobEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

//! Submit one prompt and follow the job to a terminal state.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use vidgen_client::{ClientConfig, JobController, JobError, JobEvent, JobSnapshot, VideoApi};
use vidgen_core::types::{JobId, JobState};

use crate::args::Cli;
use crate::render::{render_event, render_event_json};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed {
        job_id: JobId,
        /// Absolute URL of the finished video, when the backend sent one.
        video_url: Option<String>,
        saved_to: Option<PathBuf>,
    },
    Failed {
        message: String,
    },
    /// The shutdown signal fired before the job finished.
    Cancelled,
}

/// Where a download should land: `path` itself, or a timestamped file
/// inside it when `path` is an existing directory.
pub fn download_destination(path: &Path, now_millis: i64) -> PathBuf {
    if path.is_dir() {
        path.join(format!("video_{now_millis}.mp4"))
    } else {
        path.to_path_buf()
    }
}

/// Submit `cli.prompt`, print events to `out` until the job completes or
/// fails, and optionally download the result.
///
/// `shutdown` abandons the job when it resolves (the binary passes
/// Ctrl-C). Job failures are reported through [`Outcome::Failed`]; only
/// local problems (client construction, writing output, saving the
/// download) are returned as errors.
pub async fn run<W, S>(
    cli: &Cli,
    config: ClientConfig,
    out: &mut W,
    shutdown: S,
) -> anyhow::Result<Outcome>
where
    W: Write,
    S: Future<Output = ()>,
{
    let api = VideoApi::from_config(&config).context("Failed to build HTTP client")?;
    let controller = JobController::from_config(api, &config);
    let mut events = controller.subscribe();
    tokio::pin!(shutdown);

    tracing::info!(
        api_url = %config.api_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Starting video generation",
    );

    let submitted = tokio::select! {
        result = controller.submit(&cli.prompt) => result,
        _ = &mut shutdown => {
            controller.reset().await;
            writeln!(out, "Cancelled")?;
            return Ok(Outcome::Cancelled);
        }
    };

    let job_id = match submitted {
        Ok(job_id) => job_id,
        Err(e) => {
            while let Ok(event) = events.try_recv() {
                emit(out, &event, cli.json)?;
            }
            let message = e.to_string();
            // Transport failures were already printed via their event.
            if matches!(e, JobError::Validation(_)) {
                writeln!(out, "{message}")?;
            }
            return Ok(Outcome::Failed { message });
        }
    };

    let result_url = loop {
        let event = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(job_id = %job_id, "Shutdown requested, abandoning job");
                controller.reset().await;
                writeln!(out, "Cancelled")?;
                return Ok(Outcome::Cancelled);
            }
            event = events.recv() => match event {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                    // The terminal event may have been among the dropped ones.
                    match terminal_event(&controller.snapshot().await) {
                        Some(event) => event,
                        None => continue,
                    }
                }
                Err(RecvError::Closed) => anyhow::bail!("Job controller stopped unexpectedly"),
            }
        };

        emit(out, &event, cli.json)?;
        match event {
            JobEvent::Completed { result_url, .. } => break result_url,
            JobEvent::Failed { message, .. } => return Ok(Outcome::Failed { message }),
            _ => {}
        }
    };

    let api = controller.backend();
    let video_url = match result_url.as_deref() {
        Some(url) => Some(api.resolve_url(url).context("Backend sent an unusable video URL")?),
        None => None,
    };

    if !cli.json {
        if let Some(url) = &video_url {
            writeln!(out, "Video: {url}")?;
        }
        writeln!(out, "Download: {}", api.download_url(&job_id))?;
    }

    let saved_to = match &cli.download {
        Some(path) => {
            let dest = download_destination(path, chrono::Utc::now().timestamp_millis());
            let bytes = api
                .download(&job_id, &dest)
                .await
                .with_context(|| format!("Failed to download video to {}", dest.display()))?;
            if !cli.json {
                writeln!(out, "Saved {bytes} bytes to {}", dest.display())?;
            }
            Some(dest)
        }
        None => None,
    };

    Ok(Outcome::Completed {
        job_id,
        video_url,
        saved_to,
    })
}

/// The event a settled job would have emitted last, rebuilt from its
/// snapshot. `None` while the job is still running.
fn terminal_event(snapshot: &JobSnapshot) -> Option<JobEvent> {
    let job = snapshot.job.as_ref()?;
    match snapshot.state {
        JobState::Completed => Some(JobEvent::Completed {
            job_id: job.id.clone(),
            result_url: job.result_url.clone(),
        }),
        JobState::Failed => Some(JobEvent::Failed {
            job_id: job.id.clone(),
            progress: job.progress,
            message: snapshot
                .last_error
                .clone()
                .unwrap_or_else(|| job.last_message.clone()),
        }),
        _ => None,
    }
}

fn emit<W: Write>(out: &mut W, event: &JobEvent, json: bool) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", render_event_json(event)?)?;
    } else if let Some(line) = render_event(event) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

//! Job-lifecycle controller.
//!
//! [`JobController`] owns a single job slot and drives it through
//! `Idle -> Submitting -> Processing -> {Completed | Failed}`. Submission
//! runs on the caller's task; polling runs on a spawned task that is
//! cancelled by [`reset`](JobController::reset), [`stop`](JobController::stop),
//! or a fresh [`submit`](JobController::submit).
//!
//! Every response is checked against the slot before it is applied: a
//! status reply only lands if the job id it was issued for is still the
//! active, processing job, and a submission reply only lands if no reset
//! or newer submission happened while it was in flight.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use vidgen_core::status::{StatusKind, StatusResponse};
use vidgen_core::types::{Job, JobId, JobState};
use vidgen_core::validation::validate_prompt;

use crate::api::ApiError;
use crate::backend::JobBackend;
use crate::config::ClientConfig;
use crate::error::JobError;
use crate::events::JobEvent;
use crate::poller::{self, PollExit, PollOutcome, PollSettings};

/// Broadcast channel capacity for job events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Read-only view of the controller's job slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub state: JobState,
    /// Present from acceptance until reset.
    pub job: Option<Job>,
    /// Message of the most recent failure, including submission failures
    /// that never produced a job.
    pub last_error: Option<String>,
}

impl JobSnapshot {
    /// Current progress, 0 when there is no job.
    pub fn progress(&self) -> u8 {
        self.job.as_ref().map_or(0, |job| job.progress)
    }

    /// Latest status text from the job, if any.
    pub fn message(&self) -> Option<&str> {
        self.job.as_ref().map(|job| job.last_message.as_str())
    }

    pub fn result_url(&self) -> Option<&str> {
        self.job.as_ref().and_then(|job| job.result_url.as_deref())
    }
}

/// Drives one generation job at a time against a [`JobBackend`].
///
/// Cheap to clone; clones share the same job slot.
pub struct JobController<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for JobController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B> {
    backend: B,
    settings: PollSettings,
    slot: Mutex<Slot>,
    event_tx: broadcast::Sender<JobEvent>,
}

/// The single mutable job slot. Only the controller writes to it.
struct Slot {
    state: JobState,
    job: Option<Job>,
    last_error: Option<String>,
    /// Bumped by every reset and submission; stale submission replies
    /// are recognised by a mismatch.
    epoch: u64,
    /// Cancels the running poller, if any.
    poller: Option<CancellationToken>,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: JobState::Idle,
            job: None,
            last_error: None,
            epoch: 0,
            poller: None,
        }
    }

    fn stop_poller(&mut self) -> bool {
        match self.poller.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// The job a status reply for `job_id` may still update.
    fn processing_job(&mut self, job_id: &JobId) -> Option<&mut Job> {
        self.job
            .as_mut()
            .filter(|job| &job.id == job_id && job.state == JobState::Processing)
    }

    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            state: self.state,
            job: self.job.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

impl<B: JobBackend> JobController<B> {
    pub fn new(backend: B, settings: PollSettings) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend,
                settings,
                slot: Mutex::new(Slot::new()),
                event_tx,
            }),
        }
    }

    pub fn from_config(backend: B, config: &ClientConfig) -> Self {
        Self::new(backend, PollSettings::from(config))
    }

    /// Subscribe to job events. Only events sent after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub async fn snapshot(&self) -> JobSnapshot {
        self.inner.slot.lock().await.snapshot()
    }

    pub async fn state(&self) -> JobState {
        self.inner.slot.lock().await.state
    }

    /// Id of the current job, used for download links. `None` when idle
    /// or still submitting.
    pub async fn job_id(&self) -> Option<JobId> {
        self.inner
            .slot
            .lock()
            .await
            .job
            .as_ref()
            .map(|job| job.id.clone())
    }

    /// Validate `prompt`, start a job for it, and begin polling.
    ///
    /// Validation failures return immediately without touching the slot
    /// or the network. Otherwise any previous job is abandoned (its poller
    /// cancelled) before the request goes out. On a transport failure the
    /// slot returns to `Idle` and the error is also recorded in
    /// [`JobSnapshot::last_error`].
    pub async fn submit(&self, prompt: &str) -> Result<JobId, JobError> {
        let prompt = validate_prompt(prompt)?;

        let epoch = {
            let mut slot = self.inner.slot.lock().await;
            if slot.stop_poller() {
                tracing::info!("Abandoning previous job for a new submission");
            }
            slot.epoch += 1;
            slot.state = JobState::Submitting;
            slot.job = None;
            slot.last_error = None;
            self.inner.emit(JobEvent::StateChanged {
                job_id: None,
                state: JobState::Submitting,
            });
            slot.epoch
        };

        tracing::info!(prompt_chars = prompt.chars().count(), "Submitting generation request");
        let result = self.inner.backend.submit(&prompt).await;

        let mut slot = self.inner.slot.lock().await;
        if slot.epoch != epoch {
            tracing::debug!(?result, "Discarding reply for an abandoned submission");
            return Err(JobError::Superseded);
        }

        match result {
            Ok(job_id) => {
                let job = Job::accepted(job_id.clone(), prompt);
                let cancel = CancellationToken::new();

                tracing::info!(job_id = %job_id, "Generation job accepted");
                self.inner.emit(JobEvent::StateChanged {
                    job_id: Some(job_id.clone()),
                    state: JobState::Processing,
                });
                self.inner.emit(JobEvent::Progress {
                    job_id: job_id.clone(),
                    progress: job.progress,
                    message: job.last_message.clone(),
                });

                slot.state = JobState::Processing;
                slot.job = Some(job);
                slot.poller = Some(cancel.clone());

                Inner::spawn_poller(&self.inner, job_id.clone(), cancel);
                Ok(job_id)
            }
            Err(e) => {
                let err = JobError::submit(e);
                let message = err.to_string();
                tracing::error!(error = %message, "Generation request failed");

                slot.state = JobState::Idle;
                slot.last_error = Some(message.clone());
                self.inner.emit(JobEvent::SubmissionFailed { message });
                self.inner.emit(JobEvent::StateChanged {
                    job_id: None,
                    state: JobState::Idle,
                });
                Err(err)
            }
        }
    }

    /// Abandon whatever is in the slot and return to `Idle`.
    ///
    /// Allowed from any state. Cancels polling; replies that arrive later
    /// for the abandoned job are discarded. Calling it twice is the same
    /// as calling it once.
    pub async fn reset(&self) {
        let mut slot = self.inner.slot.lock().await;
        slot.stop_poller();
        slot.epoch += 1;
        slot.job = None;
        slot.last_error = None;

        if slot.state != JobState::Idle {
            tracing::info!(from = %slot.state, "Job controller reset");
            slot.state = JobState::Idle;
            self.inner.emit(JobEvent::StateChanged {
                job_id: None,
                state: JobState::Idle,
            });
        }
    }

    /// Stop polling without changing the job. A no-op when nothing is
    /// polling.
    pub async fn stop(&self) {
        let mut slot = self.inner.slot.lock().await;
        if slot.stop_poller() {
            tracing::info!("Polling stopped");
        }
    }
}

impl<B: JobBackend> Inner<B> {
    fn emit(&self, event: JobEvent) {
        // A send error only means nobody is listening.
        let _ = self.event_tx.send(event);
    }

    fn spawn_poller(inner: &Arc<Self>, job_id: JobId, cancel: CancellationToken) {
        let inner = Arc::clone(inner);

        tokio::spawn(async move {
            tracing::debug!(
                job_id = %job_id,
                interval_ms = inner.settings.interval.as_millis() as u64,
                "Status polling started",
            );

            let exit = poller::poll_loop(inner.settings, &cancel, |attempt| {
                let inner = &inner;
                let job_id = &job_id;
                async move {
                    let result = inner.backend.status(job_id).await;
                    inner.apply_status(job_id, attempt, result).await
                }
            })
            .await;

            match exit {
                PollExit::Exhausted { attempts } => {
                    inner
                        .fail_if_current(&job_id, JobError::PollLimitExceeded { attempts })
                        .await;
                }
                PollExit::Cancelled => {
                    tracing::debug!(job_id = %job_id, "Status polling cancelled");
                }
                PollExit::Finished => {
                    tracing::debug!(job_id = %job_id, "Status polling finished");
                }
            }
        });
    }

    /// Apply one status reply to the slot.
    async fn apply_status(
        &self,
        job_id: &JobId,
        attempt: u32,
        result: Result<StatusResponse, ApiError>,
    ) -> PollOutcome {
        let mut slot = self.slot.lock().await;

        if slot.processing_job(job_id).is_none() {
            tracing::debug!(job_id = %job_id, attempt, "Discarding stale status reply");
            return PollOutcome::Finished;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.fail(&mut slot, JobError::poll(e));
                return PollOutcome::Finished;
            }
        };

        match response.kind() {
            Some(StatusKind::Processing) => {
                let Some(job) = slot.processing_job(job_id) else {
                    return PollOutcome::Finished;
                };
                job.apply_processing(response.message);
                tracing::debug!(
                    job_id = %job_id,
                    attempt,
                    progress = job.progress,
                    message = %job.last_message,
                    "Job still processing",
                );
                self.emit(JobEvent::Progress {
                    job_id: job.id.clone(),
                    progress: job.progress,
                    message: job.last_message.clone(),
                });
                PollOutcome::Continue
            }
            Some(StatusKind::Completed) => {
                self.complete(&mut slot, response.video_url);
                PollOutcome::Finished
            }
            Some(StatusKind::Error) => {
                self.fail(&mut slot, JobError::backend_reported(&response.message));
                PollOutcome::Finished
            }
            None => {
                self.fail(
                    &mut slot,
                    JobError::Protocol {
                        status: response.status,
                    },
                );
                PollOutcome::Finished
            }
        }
    }

    async fn fail_if_current(&self, job_id: &JobId, err: JobError) {
        let mut slot = self.slot.lock().await;
        if slot.processing_job(job_id).is_some() {
            self.fail(&mut slot, err);
        }
    }

    fn complete(&self, slot: &mut Slot, result_url: Option<String>) {
        slot.stop_poller();
        let Some(job) = slot.job.as_mut() else {
            return;
        };
        job.complete(result_url);
        slot.state = JobState::Completed;

        tracing::info!(
            job_id = %job.id,
            result_url = job.result_url.as_deref().unwrap_or("<none>"),
            "Video generation completed",
        );
        self.emit(JobEvent::Progress {
            job_id: job.id.clone(),
            progress: job.progress,
            message: job.last_message.clone(),
        });
        self.emit(JobEvent::Completed {
            job_id: job.id.clone(),
            result_url: job.result_url.clone(),
        });
        self.emit(JobEvent::StateChanged {
            job_id: Some(job.id.clone()),
            state: JobState::Completed,
        });
    }

    fn fail(&self, slot: &mut Slot, err: JobError) {
        slot.stop_poller();
        let message = err.to_string();
        slot.last_error = Some(message.clone());
        let Some(job) = slot.job.as_mut() else {
            return;
        };
        job.fail(message.clone());
        slot.state = JobState::Failed;

        tracing::error!(
            job_id = %job.id,
            progress = job.progress,
            error = %message,
            "Video generation failed",
        );
        self.emit(JobEvent::Failed {
            job_id: job.id.clone(),
            progress: job.progress,
            message,
        });
        self.emit(JobEvent::StateChanged {
            job_id: Some(job.id.clone()),
            state: JobState::Failed,
        });
    }
}

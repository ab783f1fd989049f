//! HTTP client and job-lifecycle controller for the video generation
//! backend.
//!
//! [`JobController`] submits a prompt, polls the job's status on a fixed
//! interval, estimates progress, and broadcasts [`JobEvent`]s to whoever
//! is presenting the job.

pub mod api;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod poller;

pub use api::VideoApi;
pub use backend::JobBackend;
pub use config::ClientConfig;
pub use controller::{JobController, JobSnapshot};
pub use error::JobError;
pub use events::JobEvent;

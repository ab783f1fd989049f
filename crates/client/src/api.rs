//! REST client for the video generation backend.
//!
//! Wraps the three HTTP endpoints (submission, status, download) using
//! [`reqwest`].

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use vidgen_core::status::{ErrorBody, StatusResponse, SubmitRequest, SubmitResponse};
use vidgen_core::types::JobId;

use crate::config::ClientConfig;

/// HTTP client for a single backend instance.
#[derive(Debug, Clone)]
pub struct VideoApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message taken from the response body, or derived from the status.
        message: String,
    },

    /// Writing a downloaded artifact to disk failed.
    #[error("Failed to write download: {0}")]
    Io(#[from] std::io::Error),

    /// A URL could not be built from the base URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl VideoApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Build a client from [`ClientConfig`], applying the request timeout
    /// when one is configured.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config.api_url.clone()))
    }

    /// Base HTTP URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Start a generation job.
    ///
    /// Sends `POST /api/generate-video` with the prompt and returns the
    /// backend-assigned job id.
    pub async fn submit(&self, prompt: &str) -> Result<SubmitResponse, ApiError> {
        let body = SubmitRequest {
            prompt: prompt.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/generate-video", self.api_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current status of a job.
    ///
    /// Sends `GET /api/status/{job_id}`.
    pub async fn status(&self, job_id: &JobId) -> Result<StatusResponse, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/status/{}", self.api_url, job_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Direct download link for a finished job's artifact.
    pub fn download_url(&self, job_id: &JobId) -> String {
        format!("{}/api/download/{}", self.api_url, job_id)
    }

    /// Stream a finished job's artifact into `dest`.
    ///
    /// Returns the number of bytes written. `dest` is created or truncated.
    pub async fn download(&self, job_id: &JobId, dest: &Path) -> Result<u64, ApiError> {
        let response = self.client.get(self.download_url(job_id)).send().await?;
        let response = Self::ensure_success(response).await?;

        // Stream into a sibling `.part` file so `dest` only ever holds a
        // complete artifact.
        let partial = partial_path(dest);
        let written = match Self::stream_to_file(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    tracing::warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial download");
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, dest).await?;

        tracing::debug!(job_id = %job_id, bytes = written, path = %dest.display(), "Artifact downloaded");
        Ok(written)
    }

    /// Resolve a `video_url` from a status response against the base URL.
    ///
    /// Absolute URLs are returned unchanged; relative ones (the backend
    /// usually sends `/static/...`) are joined onto the base.
    pub fn resolve_url(&self, url: &str) -> Result<String, ApiError> {
        let base = reqwest::Url::parse(&format!("{}/", self.api_url)).map_err(|e| {
            ApiError::InvalidUrl {
                url: self.api_url.clone(),
                reason: e.to_string(),
            }
        })?;
        base.join(url)
            .map(String::from)
            .map_err(|e| ApiError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    // ---- private helpers ----

    async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<u64, ApiError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Ensure the response has a success status code. On failure the body
    /// is mined for a readable message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: ErrorBody::message_from(&body, status.as_u16()),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// `dest` with `.part` appended to its file name.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = VideoApi::new("http://localhost:8000/");
        assert_eq!(api.api_url(), "http://localhost:8000");
    }

    #[test]
    fn download_url_uses_job_id() {
        let api = VideoApi::new("http://localhost:8000");
        assert_eq!(
            api.download_url(&JobId::from("abc-123")),
            "http://localhost:8000/api/download/abc-123"
        );
    }

    #[test]
    fn resolve_relative_video_url() {
        let api = VideoApi::new("http://localhost:8000");
        assert_eq!(
            api.resolve_url("/static/videos/abc.mp4").unwrap(),
            "http://localhost:8000/static/videos/abc.mp4"
        );
    }

    #[test]
    fn resolve_absolute_video_url_is_unchanged() {
        let api = VideoApi::new("http://localhost:8000");
        assert_eq!(
            api.resolve_url("https://cdn.example.com/v.mp4").unwrap(),
            "https://cdn.example.com/v.mp4"
        );
    }

    #[test]
    fn resolve_with_bad_base_is_an_error() {
        let api = VideoApi::new("not a url");
        assert!(matches!(
            api.resolve_url("/x.mp4"),
            Err(ApiError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/tmp/out/video_1.mp4")),
            PathBuf::from("/tmp/out/video_1.mp4.part")
        );
    }

    #[test]
    fn status_error_displays_message_only() {
        let err = ApiError::Status {
            status: 404,
            message: "Job ID not found".into(),
        };
        assert_eq!(err.to_string(), "Job ID not found");
    }
}

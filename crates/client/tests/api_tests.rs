//! HTTP-level tests for [`VideoApi`] and the controller running on top of
//! it, against a `mockito` server.

use std::time::Duration;

use assert_matches::assert_matches;
use mockito::{Matcher, Server};
use serde_json::json;
use vidgen_client::api::ApiError;
use vidgen_client::poller::PollSettings;
use vidgen_client::{JobController, JobEvent, VideoApi};
use vidgen_core::status::StatusKind;
use vidgen_core::types::{JobId, JobState};

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_posts_prompt_and_reads_job_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate-video")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "prompt": "a cat surfing" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "job_id": "6f1c",
                "status": "processing",
                "message": "Video generation has started"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = VideoApi::new(server.url());
    let response = api.submit("a cat surfing").await.unwrap();

    assert_eq!(response.job_id, JobId::from("6f1c"));
    assert_eq!(response.message.as_deref(), Some("Video generation has started"));
    mock.assert_async().await;
}

#[tokio::test]
async fn submit_failure_uses_detail_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate-video")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Prompt is required"}"#)
        .create_async()
        .await;

    let api = VideoApi::new(server.url());
    let err = api.submit(" ").await.unwrap_err();

    assert_matches!(err, ApiError::Status { status: 400, ref message } if message == "Prompt is required");
}

#[tokio::test]
async fn submit_failure_without_body_uses_status_code() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate-video")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let api = VideoApi::new(server.url());
    let err = api.submit("a prompt").await.unwrap_err();

    assert_eq!(err.to_string(), "HTTP error, status: 502");
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    // Nothing listens on the discard port.
    let api = VideoApi::new("http://127.0.0.1:9");
    let err = api.submit("a prompt").await.unwrap_err();
    assert_matches!(err, ApiError::Request(_));
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_reads_completed_job() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/status/6f1c")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "job_id": "6f1c",
                "status": "completed",
                "message": "Video generation completed successfully",
                "video_url": "/static/videos/6f1c.mp4"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = VideoApi::new(server.url());
    let status = api.status(&JobId::from("6f1c")).await.unwrap();

    assert_eq!(status.kind(), Some(StatusKind::Completed));
    assert_eq!(status.video_url.as_deref(), Some("/static/videos/6f1c.mp4"));
}

#[tokio::test]
async fn status_for_unknown_job_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/status/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Job ID not found"}"#)
        .create_async()
        .await;

    let api = VideoApi::new(server.url());
    let err = api.status(&JobId::from("missing")).await.unwrap_err();

    assert_eq!(err.to_string(), "Job ID not found");
}

#[tokio::test]
async fn malformed_status_body_is_a_request_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/status/J1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"no status field"}"#)
        .create_async()
        .await;

    let api = VideoApi::new(server.url());
    let err = api.status(&JobId::from("J1")).await.unwrap_err();

    assert_matches!(err, ApiError::Request(_));
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_streams_artifact_to_file() {
    let mut server = Server::new_async().await;
    let bytes = vec![7u8; 64 * 1024];
    server
        .mock("GET", "/api/download/J1")
        .with_status(200)
        .with_header("content-type", "video/mp4")
        .with_body(bytes.clone())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.mp4");

    let api = VideoApi::new(server.url());
    let written = api.download(&JobId::from("J1"), &dest).await.unwrap();

    assert_eq!(written, bytes.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), bytes);
}

#[tokio::test]
async fn download_of_unfinished_job_fails_without_creating_file() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/download/J1")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Video not ready for download"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.mp4");

    let api = VideoApi::new(server.url());
    let err = api.download(&JobId::from("J1"), &dest).await.unwrap_err();

    assert_eq!(err.to_string(), "Video not ready for download");
    assert!(!dest.exists());
}

#[tokio::test]
async fn truncated_download_leaves_no_file() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promise 1000 bytes, send 10, then hang up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: video/mp4\r\ncontent-length: 1000\r\n\r\n0123456789")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.mp4");

    let api = VideoApi::new(format!("http://{addr}"));
    let err = api.download(&JobId::from("J1"), &dest).await.unwrap_err();

    assert_matches!(err, ApiError::Request(_));
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ---------------------------------------------------------------------------
// Controller over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn controller_runs_job_to_completion_over_http() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate-video")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"job_id":"J9","status":"processing","message":"started"}"#)
        .create_async()
        .await;
    let status_mock = server
        .mock("GET", "/api/status/J9")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"job_id":"J9","status":"completed","message":"done","video_url":"/static/videos/J9.mp4"}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let api = VideoApi::new(server.url());
    let ctl = JobController::new(
        api,
        PollSettings {
            interval: Duration::from_millis(50),
            max_attempts: None,
        },
    );
    let mut rx = ctl.subscribe();

    ctl.submit("a lighthouse at dusk").await.unwrap();

    let completed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let JobEvent::Completed { result_url, .. } = rx.recv().await.unwrap() {
                return result_url;
            }
        }
    })
    .await
    .expect("job should complete");

    assert_eq!(completed.as_deref(), Some("/static/videos/J9.mp4"));
    assert_eq!(ctl.state().await, JobState::Completed);

    let url = ctl.backend().resolve_url(completed.as_deref().unwrap()).unwrap();
    assert_eq!(url, format!("{}/static/videos/J9.mp4", server.url()));

    // Give a stray tick the chance to fire; it must not.
    tokio::time::sleep(Duration::from_millis(200)).await;
    status_mock.assert_async().await;
}

#[tokio::test]
async fn controller_surfaces_http_failure_on_poll() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate-video")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"job_id":"J5"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/status/J5")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let ctl = JobController::new(
        VideoApi::new(server.url()),
        PollSettings {
            interval: Duration::from_millis(20),
            max_attempts: None,
        },
    );
    let mut rx = ctl.subscribe();
    ctl.submit("a prompt").await.unwrap();

    let message = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let JobEvent::Failed { message, .. } = rx.recv().await.unwrap() {
                return message;
            }
        }
    })
    .await
    .expect("job should fail");

    assert_eq!(message, "Failed to get status: HTTP error, status: 500");
    assert_eq!(ctl.snapshot().await.progress(), 10);
}

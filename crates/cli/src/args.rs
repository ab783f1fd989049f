use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use vidgen_client::ClientConfig;

/// Generate a video from a text prompt and wait for it to finish.
#[derive(Debug, Parser)]
#[command(name = "vidgen", version, about)]
pub struct Cli {
    /// Text prompt describing the video (at most 200 characters).
    pub prompt: String,

    /// Backend base URL. Overrides `VIDGEN_API_URL`.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Seconds between status checks. Overrides `VIDGEN_POLL_INTERVAL_SECS`.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: Option<u64>,

    /// Give up after this many status checks. Overrides `VIDGEN_MAX_POLL_ATTEMPTS`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_polls: Option<u32>,

    /// Save the finished video here. A directory gets `video_<millis>.mp4`.
    #[arg(long, value_name = "PATH")]
    pub download: Option<PathBuf>,

    /// Print job events as JSON lines instead of text.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the environment config.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.api_url {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(n) = self.max_polls {
            config.max_poll_attempts = Some(n);
        }
        config
    }
}

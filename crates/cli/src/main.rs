//! `vidgen` -- submit a prompt to the video generation backend and follow
//! the job until the video is ready.
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default                 | Description                         |
//! |-------------------------------|----------|-------------------------|-------------------------------------|
//! | `VIDGEN_API_URL`              | no       | `http://localhost:8000` | Backend base URL                    |
//! | `VIDGEN_POLL_INTERVAL_SECS`   | no       | `3`                     | Seconds between status checks       |
//! | `VIDGEN_MAX_POLL_ATTEMPTS`    | no       | --                      | Give up after this many checks      |
//! | `VIDGEN_REQUEST_TIMEOUT_SECS` | no       | --                      | Per-request timeout                 |
//! | `RUST_LOG`                    | no       | `vidgen_cli=warn,...`   | Log filter (logs go to stderr)      |
//!
//! Command-line flags override the environment.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidgen_cli::run::Outcome;
use vidgen_cli::{Cli, DEFAULT_LOG_FILTER};
use vidgen_client::ClientConfig;

/// Exit code for a job that failed or was rejected.
const EXIT_FAILED: i32 = 1;
/// Exit code for bad configuration.
const EXIT_CONFIG: i32 = 2;
/// Exit code after Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(EXIT_CONFIG);
    });
    let config = cli.apply(config);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = std::io::stdout();
    match vidgen_cli::run(&cli, config, &mut stdout, shutdown).await {
        Ok(Outcome::Completed { .. }) => {}
        Ok(Outcome::Failed { .. }) => std::process::exit(EXIT_FAILED),
        Ok(Outcome::Cancelled) => std::process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(EXIT_FAILED);
        }
    }
}

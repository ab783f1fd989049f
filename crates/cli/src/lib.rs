//! `vidgen-cli` library crate.
//!
//! Re-exports the argument parser, event rendering, and the run loop so
//! they can be exercised by integration tests. The binary entrypoint
//! lives in `main.rs`.

pub mod args;
pub mod render;
pub mod run;

pub use args::Cli;
pub use run::run;

/// `EnvFilter` directives used when `RUST_LOG` is unset. Progress goes to
/// stdout, so logs on stderr stay quiet unless asked for.
pub const DEFAULT_LOG_FILTER: &str = "vidgen_cli=warn,vidgen_client=warn";

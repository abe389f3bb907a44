//! Command line entry points for the papermill research pipeline.
//!
//! This crate builds three independent binaries on top of the `papermill` library:
//!
//! ```bash
//! # Ask the chat model for papers about a topic and download their PDFs
//! search-and-download "lattice cryptography" -n 5 -o papers
//!
//! # Convert one PDF to LaTeX through the extraction service
//! convert-to-latex https://arxiv.org/pdf/2301.07041 --out output
//!
//! # Search, rank, convert and synthesize a manuscript draft
//! write-manuscript "lattice cryptography" --manuscript manuscript.tex
//! ```
//!
//! All of them read API keys from `API_KEY` / `OPENAI_API_KEY` or a `.env` file, accept a TOML
//! configuration through `--config`, and support various verbosity levels through `-v`.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{builder::ArgAction, Args, Parser};
use console::style;
use papermill::{
  chat::ChatClient,
  config::Config,
  discovery,
  error::PapermillError,
  extraction::Extractor,
  http::HttpClient,
  paper::{Group, Paper},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

pub use crate::{error::*, interaction::*};

/// Options shared by every binary.
#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(short, long, action = ArgAction::Count, help = "Increase logging verbosity")]
  pub verbose: u8,

  /// Path to a TOML configuration file. Defaults to the platform config directory when present.
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Key=value file consulted for API keys not set in the environment
  #[arg(long, default_value = ".env")]
  pub env_file: PathBuf,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true)]
  pub accept_defaults: bool,
}

impl GlobalArgs {
  /// Loads the configuration file and fills in credentials.
  pub fn load_config(&self) -> Result<Config> {
    let config = Config::load(self.config.as_deref())?.with_credentials_file(&self.env_file)?;
    debug!("Using configuration: {config:?}");
    Ok(config)
  }
}

/// Polling overrides for binaries that talk to the extraction service.
#[derive(Args, Clone, Debug, Default)]
pub struct PollArgs {
  /// Seconds between task status queries
  #[arg(long)]
  pub poll_interval: Option<u64>,

  /// Give up waiting for a task after this many seconds (0 waits indefinitely)
  #[arg(long)]
  pub poll_timeout: Option<u64>,

  /// Give up waiting for a task after this many status queries
  #[arg(long)]
  pub max_polls: Option<u32>,
}

impl PollArgs {
  /// Applies the overrides on top of `config`.
  pub fn apply(&self, mut config: Config) -> Config {
    if let Some(interval) = self.poll_interval {
      config = config.with_poll_interval(interval);
    }
    if let Some(timeout) = self.poll_timeout {
      config = config.with_poll_timeout((timeout > 0).then_some(timeout));
    }
    if let Some(max_polls) = self.max_polls {
      config = config.with_max_polls(Some(max_polls));
    }
    config
  }
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set. Logs go to stderr so progress output on stdout stays
/// readable.
pub fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Returns a token that is cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
  let token = CancellationToken::new();
  let trigger = token.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      trigger.cancel();
    }
  });
  token
}

/// Prints a failure and maps the outcome to the process exit code.
pub fn report<T>(result: Result<T>) -> ExitCode {
  match result {
    Ok(_) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("{}{}", style(ERROR_PREFIX).red(), style(e.to_string()).red());
      ExitCode::FAILURE
    },
  }
}

//! Error types for the papermill library.
//!
//! Every failure in the pipeline surfaces as a [`PapermillError`]. None of these are retried or
//! swallowed by the library; callers decide whether a failure aborts the run.
//!
//! # Examples
//!
//! ```no_run
//! use papermill::{config::Config, error::PapermillError, extraction::Extractor};
//!
//! # async fn example() -> Result<(), PapermillError> {
//! let extractor = Extractor::new(&Config::load(None)?)?;
//! match extractor.submit("https://example.org/paper.pdf").await {
//!   Err(PapermillError::Request { status, .. }) => println!("HTTP status {status}"),
//!   Err(PapermillError::Protocol { code, message }) => println!("service code {code}: {message}"),
//!   Err(e) => println!("Other error: {e}"),
//!   Ok(task_id) => println!("Submitted {task_id}"),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Error type alias used for the [`papermill`](crate) crate.
pub type Result<T> = core::result::Result<T, PapermillError>;

/// Errors that can occur while running the paper pipeline.
#[derive(Error, Debug)]
pub enum PapermillError {
  /// A required API key was found neither in the environment nor in the key=value file.
  ///
  /// The string parameter names the variable that was looked up.
  #[error("{0} not found in environment or credentials file")]
  CredentialMissing(String),

  /// A remote service answered with a non-2xx HTTP status.
  #[error("request to {url} failed with HTTP status {status}")]
  Request {
    /// The HTTP status code returned
    status: u16,
    /// The URL that was requested
    url:    String,
  },

  /// A network request failed before a status could be observed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - The request times out
  /// - The response body cannot be decoded
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The extraction service answered successfully at the HTTP level but reported a nonzero
  /// status code, or its envelope was missing the expected payload.
  #[error("service reported code {code}: {message}")]
  Protocol {
    /// Status code from the response envelope
    code:    i64,
    /// Message from the envelope, or a description of what was missing
    message: String,
  },

  /// The extraction service reported that the task failed.
  #[error("Task failed: {0}")]
  RemoteTask(String),

  /// A language model reply could not be parsed into the expected JSON shape.
  #[error("model response is not valid JSON for the expected schema: {0}")]
  ResponseFormat(String),

  /// The result archive is not a readable ZIP container, or a member would be written outside
  /// the destination directory.
  #[error("archive error: {0}")]
  Archive(String),

  /// Polling gave up before the task reached a terminal state.
  #[error("task {task_id} did not finish after {attempts} polls")]
  PollTimeout {
    /// The task being polled
    task_id:  String,
    /// Number of status queries issued before giving up
    attempts: u32,
  },

  /// The operation was cancelled through its cancellation token.
  #[error("operation cancelled")]
  Cancelled,

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// A configured base URL or a returned URL could not be parsed.
  #[error(transparent)]
  Url(#[from] url::ParseError),

  /// JSON serialization failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// The configuration file is not valid TOML for [`Config`](crate::config::Config).
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// Any other configuration problem.
  #[error("{0}")]
  Config(String),

  /// A chat request was sent without a model.
  #[error("No model was chosen for the chat request.")]
  ChatMissingModel,

  /// A chat request was sent without any messages.
  #[error("No messages were supplied to send to the chat model.")]
  ChatMissingMessage,
}

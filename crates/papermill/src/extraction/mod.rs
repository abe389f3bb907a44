//! Client for the asynchronous document-extraction service.
//!
//! Converting a PDF is a three step flow against the remote service:
//!
//! 1. [`Extractor::submit`] posts the document URL and receives a task identifier
//! 2. [`Extractor::await_completion`] polls the task until it is `done` or `failed`
//! 3. [`archive::materialize`] downloads the result archive and unpacks it
//!
//! [`Extractor::convert`] chains all three.
//!
//! The remote service owns the task state; this client only observes it. Polling is bounded by a
//! [`PollPolicy`] and can be interrupted through a [`CancellationToken`].
//!
//! # Examples
//!
//! ```no_run
//! use papermill::{config::Config, extraction::Extractor};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?.with_credentials_file(".env")?;
//! let extractor = Extractor::new(&config)?;
//!
//! let task_id = extractor.submit("https://arxiv.org/pdf/2301.07041").await?;
//! let result =
//!   extractor.await_completion(&task_id, extractor.policy(), &CancellationToken::new()).await?;
//! println!("Archive ready at {}", result.full_zip_url);
//! # Ok(())
//! # }
//! ```

use tokio::time::Instant;

use super::*;
use crate::credentials::EXTRACTION_KEY_VAR;

pub mod archive;

/// State of a task as reported by the service.
///
/// Only [`TaskState::Done`] and [`TaskState::Failed`] are terminal. States the client does not
/// recognize are kept as [`TaskState::Unknown`] and polled like any other non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
  /// Queued, not yet started
  Pending,
  /// Being processed
  Running,
  /// Processing finished, output formats are being produced
  Converting,
  /// Waiting for the document to be uploaded
  WaitingFile,
  /// Finished successfully, a result archive is available
  Done,
  /// Finished with an error
  Failed,
  /// Any state string this client does not know about
  #[serde(other)]
  Unknown,
}

impl TaskState {
  /// Whether the service will report no further transitions.
  pub fn is_terminal(&self) -> bool { matches!(self, Self::Done | Self::Failed) }
}

/// Page progress reported while a task is running.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractProgress {
  /// Pages processed so far
  #[serde(default)]
  pub extracted_pages: u64,
  /// Pages in the document
  #[serde(default)]
  pub total_pages:     u64,
}

/// A snapshot of a task, as returned by one status query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
  /// Identifier assigned on submission, when the service echoes it back
  #[serde(default)]
  pub task_id:          Option<String>,
  /// Current state
  pub state:            TaskState,
  /// Location of the result archive, present once the task is done
  #[serde(default)]
  pub full_zip_url:     Option<String>,
  /// Failure description, present once the task has failed
  #[serde(default)]
  pub err_msg:          Option<String>,
  /// Page progress, when the service reports it
  #[serde(default)]
  pub extract_progress: Option<ExtractProgress>,
}

/// Payload of a task that finished successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
  /// Identifier of the finished task
  pub task_id:      String,
  /// Location of the result archive
  pub full_zip_url: String,
}

/// How long and how often to poll a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
  /// Pause between consecutive status queries
  pub interval:     Duration,
  /// Give up once this much time has passed since polling started
  pub timeout:      Option<Duration>,
  /// Give up after this many status queries
  pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
  fn default() -> Self { ExtractionConfig::default().poll_policy() }
}

/// Body of a submission request.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
  /// Publicly reachable URL of the document
  url:           &'a str,
  /// Output formats requested on top of Markdown
  extra_formats: &'a [String],
}

/// Payload of a successful submission.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
  /// Identifier of the new task
  task_id: String,
}

/// Client for the extraction service.
#[derive(Debug, Clone)]
pub struct Extractor {
  /// Authenticated client for the API itself
  api:           HttpClient,
  /// Unauthenticated client for archive downloads
  downloads:     HttpClient,
  /// API base URL including the version segment
  base_url:      String,
  /// Formats requested on every submission
  extra_formats: Vec<String>,
  /// Policy used by [`Extractor::convert`]
  policy:        PollPolicy,
}

impl Extractor {
  /// Builds a client from the configuration.
  ///
  /// # Errors
  ///
  /// Fails with [`PapermillError::CredentialMissing`] if no extraction key is configured, before
  /// any network call is made.
  pub fn new(config: &Config) -> Result<Self> {
    let key = config
      .extraction
      .api_key
      .as_deref()
      .ok_or_else(|| PapermillError::CredentialMissing(EXTRACTION_KEY_VAR.to_string()))?;

    Ok(Self {
      api:           HttpClient::new(Duration::from_secs(config.extraction.request_timeout_secs))?
        .with_bearer(key),
      downloads:     HttpClient::new(Duration::from_secs(config.download.archive_timeout_secs))?,
      base_url:      config.extraction.base_url.clone(),
      extra_formats: config.extraction.extra_formats.clone(),
      policy:        config.extraction.poll_policy(),
    })
  }

  /// The configured polling policy.
  pub fn policy(&self) -> &PollPolicy { &self.policy }

  /// Submits a document for extraction and returns the new task's identifier.
  ///
  /// # Errors
  ///
  /// - [`PapermillError::Request`] on a non-2xx response
  /// - [`PapermillError::Protocol`] if the envelope carries a nonzero code
  pub async fn submit(&self, document_url: &str) -> Result<String> {
    let url = endpoint(&self.base_url, "extract/task")?;
    let body = SubmitRequest { url: document_url, extra_formats: &self.extra_formats };

    let request = self.api.post(url).json(&body);
    let task_id = self.api.send_envelope::<SubmitResponse>(request).await?.task_id;
    info!("Submitted {document_url} as task {task_id}");
    Ok(task_id)
  }

  /// Queries the current state of a task once.
  pub async fn status(&self, task_id: &str) -> Result<Task> {
    let url = endpoint(&self.base_url, &format!("extract/task/{task_id}"))?;
    self.api.send_envelope(self.api.get(url)).await
  }

  /// Polls a task until it reaches a terminal state.
  ///
  /// Returns only when the service reports exactly [`TaskState::Done`]. One status query is
  /// issued per cycle with `policy.interval` between queries, without backoff.
  ///
  /// # Errors
  ///
  /// - [`PapermillError::RemoteTask`] with the service's message if the task failed
  /// - [`PapermillError::PollTimeout`] once the deadline or attempt budget is exhausted
  /// - [`PapermillError::Cancelled`] if `cancel` fires, including while sleeping
  /// - [`PapermillError::Protocol`] if the task is done but names no result archive
  /// - Any error from [`Extractor::status`]
  pub async fn await_completion(
    &self,
    task_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
  ) -> Result<TaskResult> {
    let deadline = policy.timeout.map(|timeout| Instant::now() + timeout);
    let past_deadline = || deadline.is_some_and(|deadline| Instant::now() >= deadline);
    let mut attempts = 0u32;

    loop {
      let task = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PapermillError::Cancelled),
        task = self.status(task_id) => task?,
      };
      attempts += 1;

      match task.state {
        TaskState::Done => {
          info!("Task {task_id} done after {attempts} polls");
          let full_zip_url = task.full_zip_url.filter(|url| !url.is_empty()).ok_or_else(|| {
            PapermillError::Protocol { code: 0, message: "No result url found".to_string() }
          })?;
          return Ok(TaskResult { task_id: task_id.to_string(), full_zip_url });
        },
        TaskState::Failed => {
          let message = task.err_msg.unwrap_or_default();
          warn!("Task {task_id} failed: {message}");
          return Err(PapermillError::RemoteTask(message));
        },
        TaskState::Unknown => warn!("Task {task_id} reported an unrecognized state"),
        state => match &task.extract_progress {
          Some(progress) => debug!(
            "Task {task_id} is {state:?} ({}/{} pages)",
            progress.extracted_pages, progress.total_pages
          ),
          None => debug!("Task {task_id} is {state:?}"),
        },
      }

      let out_of_attempts = policy.max_attempts.is_some_and(|max| attempts >= max);
      if out_of_attempts || past_deadline() {
        return Err(PapermillError::PollTimeout { task_id: task_id.to_string(), attempts });
      }

      // The pause never runs past the deadline.
      let next_poll = Instant::now() + policy.interval;
      let wake = deadline.map_or(next_poll, |deadline| deadline.min(next_poll));
      tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PapermillError::Cancelled),
        _ = tokio::time::sleep_until(wake) => {},
      }
      if past_deadline() {
        return Err(PapermillError::PollTimeout { task_id: task_id.to_string(), attempts });
      }
    }
  }

  /// Downloads and unpacks a result archive into `destination`.
  pub async fn materialize(&self, archive_url: &str, destination: &Path) -> Result<PathBuf> {
    archive::materialize(&self.downloads, archive_url, destination).await
  }

  /// Converts the PDF at `pdf_url` and unpacks the output into `output_dir`.
  ///
  /// Uses the configured [`PollPolicy`].
  pub async fn convert(
    &self,
    pdf_url: &str,
    output_dir: &Path,
    cancel: &CancellationToken,
  ) -> Result<PathBuf> {
    let task_id = self.submit(pdf_url).await?;
    let result = self.await_completion(&task_id, &self.policy, cancel).await?;
    self.materialize(&result.full_zip_url, output_dir).await
  }
}

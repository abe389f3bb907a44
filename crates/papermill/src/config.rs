//! Explicit configuration for the pipeline.
//!
//! A [`Config`] is built once at startup and handed by reference to every component that talks
//! to an external service. It can be read from a TOML file, adjusted with builder-style
//! `with_*` methods, and is completed with API keys through
//! [`Config::with_credentials_file`].
//!
//! ```toml
//! [extraction]
//! base_url = "https://mineru.net/api/v4"
//! poll_interval_secs = 5
//! poll_timeout_secs = 1800
//!
//! [chat]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-3.5-turbo"
//! ```

use super::*;
use crate::{credentials::Credentials, extraction::PollPolicy};

/// Top-level configuration object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
  /// Settings for the document-extraction service
  pub extraction: ExtractionConfig,
  /// Settings for the chat-completion service
  pub chat:       ChatConfig,
  /// Settings for plain file downloads
  pub download:   DownloadConfig,
}

/// Settings for the document-extraction service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
  /// Base URL of the API, including the version segment
  pub base_url:             String,
  /// Additional output formats requested for every task
  pub extra_formats:        Vec<String>,
  /// Seconds to wait between status polls
  pub poll_interval_secs:   u64,
  /// Give up polling after this many seconds. `None` polls without a deadline.
  pub poll_timeout_secs:    Option<u64>,
  /// Give up polling after this many status queries. `None` means no attempt budget.
  pub max_polls:            Option<u32>,
  /// Timeout applied to each individual HTTP request
  pub request_timeout_secs: u64,
  /// Bearer token, never read from or written to the config file
  #[serde(skip)]
  pub api_key:              Option<String>,
}

impl Default for ExtractionConfig {
  fn default() -> Self {
    Self {
      base_url:             "https://mineru.net/api/v4".to_string(),
      extra_formats:        vec!["latex".to_string()],
      poll_interval_secs:   5,
      poll_timeout_secs:    Some(30 * 60),
      max_polls:            None,
      request_timeout_secs: 60,
      api_key:              None,
    }
  }
}

impl ExtractionConfig {
  /// The polling policy described by this configuration.
  pub fn poll_policy(&self) -> PollPolicy {
    PollPolicy {
      interval:     Duration::from_secs(self.poll_interval_secs),
      timeout:      self.poll_timeout_secs.map(Duration::from_secs),
      max_attempts: self.max_polls,
    }
  }
}

/// Settings for the chat-completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
  /// Base URL of an OpenAI compatible API
  pub base_url:             String,
  /// Model name sent with every request
  pub model:                String,
  /// Timeout applied to each request; manuscript generation can be slow
  pub request_timeout_secs: u64,
  /// Bearer token, never read from or written to the config file
  #[serde(skip)]
  pub api_key:              Option<String>,
}

impl Default for ChatConfig {
  fn default() -> Self {
    Self {
      base_url:             "https://api.openai.com/v1".to_string(),
      model:                "gpt-3.5-turbo".to_string(),
      request_timeout_secs: 300,
      api_key:              None,
    }
  }
}

/// Settings for PDF and archive downloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
  /// Timeout for a single PDF download
  pub timeout_secs:         u64,
  /// Timeout for fetching a result archive
  pub archive_timeout_secs: u64,
}

impl Default for DownloadConfig {
  fn default() -> Self { Self { timeout_secs: 10, archive_timeout_secs: 600 } }
}

impl Config {
  /// Default location of the configuration file.
  ///
  /// - On Unix: `~/.config/papermill/config.toml`
  /// - On macOS: `~/Library/Application Support/papermill/config.toml`
  /// - Fallback: `./papermill/config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("papermill").join("config.toml")
  }

  /// Loads configuration from `path`, or from [`Config::default_path`] when it exists.
  ///
  /// Falls back to defaults when no path is given and no default file exists. An explicitly
  /// given path must exist.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(path) => path.to_path_buf(),
      None => {
        let default_path = Self::default_path();
        if !default_path.exists() {
          debug!("No config file at {default_path:?}, using defaults");
          return Ok(Self::default());
        }
        default_path
      },
    };

    debug!("Loading config from {path:?}");
    let content = std::fs::read_to_string(&path).map_err(|e| {
      PapermillError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;
    Ok(toml::from_str(&content)?)
  }

  /// Fills in API keys from the environment and the key=value file.
  ///
  /// Keys already set on the config are kept.
  pub fn with_credentials_file(self, env_file: impl AsRef<Path>) -> Result<Self> {
    let credentials = Credentials::load(Some(env_file.as_ref()))?;
    Ok(self.with_credentials(credentials))
  }

  /// Fills in API keys from already resolved credentials.
  pub fn with_credentials(mut self, credentials: Credentials) -> Self {
    if self.extraction.api_key.is_none() {
      self.extraction.api_key = credentials.extraction;
    }
    if self.chat.api_key.is_none() {
      self.chat.api_key = credentials.chat;
    }
    self
  }

  /// Sets the extraction service base URL.
  pub fn with_extraction_url(mut self, url: &str) -> Self {
    self.extraction.base_url = url.to_string();
    self
  }

  /// Sets the extraction service key.
  pub fn with_extraction_key(mut self, key: &str) -> Self {
    self.extraction.api_key = Some(key.to_string());
    self
  }

  /// Sets the chat service base URL.
  pub fn with_chat_url(mut self, url: &str) -> Self {
    self.chat.base_url = url.to_string();
    self
  }

  /// Sets the chat service key.
  pub fn with_chat_key(mut self, key: &str) -> Self {
    self.chat.api_key = Some(key.to_string());
    self
  }

  /// Sets the chat model.
  pub fn with_model(mut self, model: &str) -> Self {
    self.chat.model = model.to_string();
    self
  }

  /// Sets the interval between status polls.
  pub fn with_poll_interval(mut self, secs: u64) -> Self {
    self.extraction.poll_interval_secs = secs;
    self
  }

  /// Sets the polling deadline. `None` removes it.
  pub fn with_poll_timeout(mut self, secs: Option<u64>) -> Self {
    self.extraction.poll_timeout_secs = secs;
    self
  }

  /// Sets the maximum number of status polls. `None` removes the budget.
  pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
    self.extraction.max_polls = max_polls;
    self
  }
}

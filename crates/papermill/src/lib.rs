//! Research paper pipeline: discovery, PDF conversion and manuscript synthesis.
//!
//! `papermill` chains two external services into a single workflow:
//!
//! - A chat-completion API (OpenAI compatible) that proposes papers for a topic, groups and ranks
//!   them, and finally drafts a manuscript from notes
//! - A document-extraction API (MinerU) that converts a PDF into LaTeX through an asynchronous
//!   submit/poll/fetch task flow
//!
//! # Getting Started
//!
//! ```no_run
//! use papermill::{
//!   chat::ChatClient,
//!   config::Config,
//!   discovery,
//!   extraction::{Extractor, PollPolicy},
//!   prelude::*,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::load(None)?.with_credentials_file(".env")?;
//!
//!   let chat = ChatClient::new(&config)?;
//!   let papers = discovery::search_papers(&chat, "zero knowledge proofs", 5).await?;
//!
//!   let extractor = Extractor::new(&config)?;
//!   if let Some(url) = papers.first().and_then(|p| p.pdf_url.as_deref()) {
//!     let dir = extractor.convert(url, "output".as_ref(), &CancellationToken::new()).await?;
//!     println!("LaTeX files saved to: {}", dir.display());
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`config`]: Explicit configuration object passed into every component
//! - [`credentials`]: API key loading from the environment or a key=value file
//! - [`http`]: Thin HTTP wrapper handling auth headers and status checks
//! - [`extraction`]: Task submission, polling and result materialization
//! - [`chat`]: Chat-completion request and response types
//! - [`discovery`]: Paper discovery and ranking on top of [`chat`]
//! - [`paper`]: Core paper types and PDF download
//! - [`markup`]: Best-effort LaTeX denoising
//! - [`manuscript`]: Note collection and manuscript synthesis
//! - [`prelude`]: Common types for ergonomic imports

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
  time::Duration,
};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod chat;
pub mod config;
pub mod credentials;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod http;
pub mod manuscript;
pub mod markup;
pub mod paper;

use crate::{config::*, error::*, http::*};

/// Common types for ergonomic imports.
///
/// ```no_run
/// use papermill::{config::Config, prelude::*};
///
/// fn example() -> Result<(), PapermillError> {
///   let config = Config::load(None)?;
///   println!("Extraction service at {}", config.extraction.base_url);
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    error::PapermillError,
    paper::{Group, Paper},
  };
}

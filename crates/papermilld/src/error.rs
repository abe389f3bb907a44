//! Error types for the papermill binaries.

use thiserror::Error;

use super::*;

/// Error type alias used for the binaries.
pub type Result<T> = core::result::Result<T, PapermilldError>;

/// Errors that can end a command.
#[derive(Error, Debug)]
pub enum PapermilldError {
  /// Anything raised by the pipeline itself
  #[error(transparent)]
  Papermill(#[from] PapermillError),

  /// An interactive prompt failed, typically because no terminal is attached
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),

  /// A file system operation failed
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

//! API key lookup for the external services.
//!
//! Keys are looked up first in the process environment and then in a `.env`-style key=value
//! file. A value present in the environment always wins over the file. The file is parsed with
//! [`dotenvy`] without touching the process environment.
//!
//! # Examples
//!
//! ```no_run
//! use papermill::credentials::{load_key, EXTRACTION_KEY_VAR};
//!
//! # fn example() -> Result<(), papermill::error::PapermillError> {
//! let key = load_key(EXTRACTION_KEY_VAR, Some(".env".as_ref()))?;
//! # Ok(())
//! # }
//! ```

use super::*;

/// Environment variable holding the extraction service key.
pub const EXTRACTION_KEY_VAR: &str = "API_KEY";

/// Environment variable holding the chat-completion service key.
pub const CHAT_KEY_VAR: &str = "OPENAI_API_KEY";

/// Name of the key=value file consulted when no explicit file is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// The set of keys resolved at startup.
///
/// Either key may be absent; components that need one fail with
/// [`PapermillError::CredentialMissing`] when they are constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
  /// Key for the extraction service, from [`EXTRACTION_KEY_VAR`]
  pub extraction: Option<String>,
  /// Key for the chat-completion service, from [`CHAT_KEY_VAR`]
  pub chat:       Option<String>,
}

impl Credentials {
  /// Resolves both keys, leaving absent ones as `None`.
  pub fn load(env_file: Option<&Path>) -> Result<Self> {
    Ok(Self {
      extraction: lookup(EXTRACTION_KEY_VAR, env_file)?,
      chat:       lookup(CHAT_KEY_VAR, env_file)?,
    })
  }
}

/// Loads a single key, failing if it is found nowhere.
///
/// # Errors
///
/// - [`PapermillError::CredentialMissing`] if neither the environment nor the file has the key
/// - [`PapermillError::Config`] if the file exists but cannot be parsed
pub fn load_key(var: &str, env_file: Option<&Path>) -> Result<String> {
  lookup(var, env_file)?.ok_or_else(|| PapermillError::CredentialMissing(var.to_string()))
}

/// Environment first, then the key=value file. Empty values count as absent.
fn lookup(var: &str, env_file: Option<&Path>) -> Result<Option<String>> {
  if let Ok(value) = std::env::var(var) {
    if !value.is_empty() {
      trace!("Found {var} in environment");
      return Ok(Some(value));
    }
  }

  let path = env_file.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
  if !path.exists() {
    trace!("No credentials file at {path:?}");
    return Ok(None);
  }

  let entries = dotenvy::from_path_iter(path)
    .map_err(|e| PapermillError::Config(format!("Failed to read {}: {e}", path.display())))?;
  for entry in entries {
    let (key, value) = entry
      .map_err(|e| PapermillError::Config(format!("Failed to parse {}: {e}", path.display())))?;
    if key == var && !value.is_empty() {
      debug!("Found {var} in {path:?}");
      return Ok(Some(value));
    }
  }
  Ok(None)
}

#[cfg(test)]
mod tests {
  use serial_test::serial;

  use super::*;

  fn write_env_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
  }

  #[traced_test]
  #[test]
  #[serial]
  fn test_file_used_when_env_unset() {
    std::env::remove_var(EXTRACTION_KEY_VAR);
    let (_dir, path) = write_env_file("OTHER=1\nAPI_KEY=abc123\n");

    assert_eq!(load_key(EXTRACTION_KEY_VAR, Some(&path)).unwrap(), "abc123");
  }

  #[traced_test]
  #[test]
  #[serial]
  fn test_env_wins_over_file() {
    let (_dir, path) = write_env_file("API_KEY=from-file\n");
    std::env::set_var(EXTRACTION_KEY_VAR, "from-env");

    let key = load_key(EXTRACTION_KEY_VAR, Some(&path));
    std::env::remove_var(EXTRACTION_KEY_VAR);
    assert_eq!(key.unwrap(), "from-env");
  }

  #[traced_test]
  #[test]
  #[serial]
  fn test_missing_everywhere() {
    std::env::remove_var(CHAT_KEY_VAR);
    let (_dir, path) = write_env_file("API_KEY=abc123\n");

    match load_key(CHAT_KEY_VAR, Some(&path)) {
      Err(PapermillError::CredentialMissing(var)) => assert_eq!(var, CHAT_KEY_VAR),
      other => panic!("expected CredentialMissing, got {other:?}"),
    }
  }

  #[traced_test]
  #[test]
  #[serial]
  fn test_missing_file_is_not_an_error() {
    std::env::remove_var(EXTRACTION_KEY_VAR);
    std::env::remove_var(CHAT_KEY_VAR);
    let dir = tempdir().unwrap();

    let credentials = Credentials::load(Some(&dir.path().join("absent.env"))).unwrap();
    assert_eq!(credentials, Credentials::default());
  }
}

//! Manuscript assembly from converted papers.
//!
//! Converted LaTeX is collected into notes with [`collect_notes`], denoised with
//! [`latex_to_markdown`](crate::markup::latex_to_markdown), and sent together with the topic to
//! the chat model by [`write_manuscript`]. The model's reply is written out verbatim.

use super::*;
use crate::{chat::ChatClient, markup::latex_to_markdown};

/// System prompt for [`write_manuscript`].
const WRITER_SYSTEM_PROMPT: &str =
  "You are an academic writing agent that produces LaTeX manuscripts.";

/// Reads every `.tex` file below `dir` and returns its denoised text, one note per file.
///
/// Files are visited in path order. Invalid UTF-8 is replaced rather than rejected.
pub fn collect_notes(dir: &Path) -> Result<Vec<String>> {
  let pattern = dir.join("**").join("*.tex");
  let pattern = pattern
    .to_str()
    .ok_or_else(|| PapermillError::Config(format!("Path is not valid UTF-8: {}", dir.display())))?;

  let paths = glob::glob(pattern).map_err(|e| PapermillError::Config(e.to_string()))?;
  let mut files = paths
    .map(|entry| entry.map_err(|e| PapermillError::Io(e.into())))
    .collect::<Result<Vec<_>>>()?;
  files.sort();

  let mut notes = Vec::with_capacity(files.len());
  for file in files {
    trace!("Collecting notes from {file:?}");
    let bytes = std::fs::read(&file)?;
    notes.push(latex_to_markdown(&String::from_utf8_lossy(&bytes)));
  }
  debug!("Collected {} notes from {dir:?}", notes.len());
  Ok(notes)
}

/// Asks the model for a full LaTeX manuscript about `topic` built from `notes`, and writes the
/// reply to `output` verbatim.
///
/// Parent directories of `output` are created as needed and an existing file is overwritten.
pub async fn write_manuscript(
  chat: &ChatClient,
  topic: &str,
  notes: &[String],
  output: &Path,
) -> Result<PathBuf> {
  let prompt = format!(
    "Write a full LaTeX manuscript about '{topic}' using the following notes:\n{}",
    notes.join("\n")
  );
  let response =
    chat.request().with_system(WRITER_SYSTEM_PROMPT).with_message(&prompt).send().await?;
  let latex = response.content()?;

  if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent).await?;
  }
  tokio::fs::write(output, latex).await?;
  info!("Wrote {} bytes of manuscript to {output:?}", latex.len());
  Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::{
    matchers::{body_string_contains, method},
    Mock, MockServer, ResponseTemplate,
  };

  use super::*;

  #[test]
  fn test_collect_notes_recursively() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("b/latex")).unwrap();
    std::fs::write(dir.path().join("a.tex"), "\\section{First}").unwrap();
    std::fs::write(dir.path().join("b/latex/main.tex"), b"Second \\cite{x}\xff").unwrap();
    std::fs::write(dir.path().join("b/full.md"), "ignored").unwrap();

    let notes = collect_notes(dir.path()).unwrap();
    assert_eq!(notes, vec!["First".to_string(), "Second \u{FFFD}".to_string()]);
  }

  #[test]
  fn test_collect_notes_empty_dir() {
    let dir = tempdir().unwrap();
    assert!(collect_notes(dir.path()).unwrap().is_empty());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_write_manuscript_verbatim() {
    let server = MockServer::start().await;
    let latex = "\\documentclass{article}\n\\begin{document}Hi\\end{document}\n";
    Mock::given(method("POST"))
      .and(body_string_contains("Write a full LaTeX manuscript about 'lattices'"))
      .and(body_string_contains("note one\\nnote two"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": latex}}]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let chat =
      ChatClient::new(&Config::default().with_chat_url(&server.uri()).with_chat_key("k")).unwrap();
    let dir = tempdir().unwrap();
    let output = dir.path().join("drafts").join("manuscript.tex");
    let notes = vec!["note one".to_string(), "note two".to_string()];

    let written = write_manuscript(&chat, "lattices", &notes, &output).await.unwrap();
    assert_eq!(written, output);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), latex);
  }
}

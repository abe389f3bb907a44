//! End-to-end run of the manuscript pipeline against mocked services.

use std::{
  error::Error,
  io::{Cursor, Write},
  time::Duration,
};

use papermill::{
  chat::ChatClient,
  config::Config,
  discovery,
  extraction::Extractor,
  http::HttpClient,
  manuscript::{collect_notes, write_manuscript},
  prelude::*,
};
use serde_json::json;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::{
  matchers::{body_string_contains, method, path},
  Mock, MockServer, ResponseTemplate,
};
use zip::{write::FileOptions, ZipWriter};

pub type TestResult<T> = Result<T, Box<dyn Error>>;

fn chat_reply(content: &str) -> ResponseTemplate {
  ResponseTemplate::new(200)
    .set_body_json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
}

fn result_archive() -> Vec<u8> {
  let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
  writer.start_file("latex/paper.tex", FileOptions::default()).unwrap();
  writer.write_all(b"\\section{Lattices} are \\textbf{hard} \\cite{regev}.").unwrap();
  writer.start_file("full.md", FileOptions::default()).unwrap();
  writer.write_all(b"# Lattices").unwrap();
  writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_search_convert_and_write() -> TestResult<()> {
  let chat_server = MockServer::start().await;
  let files_server = MockServer::start().await;
  let extraction_server = MockServer::start().await;
  let pdf_url = format!("{}/pdf/lwe.pdf", files_server.uri());

  // Discovery
  Mock::given(method("POST"))
    .and(body_string_contains("Provide a JSON list"))
    .respond_with(chat_reply(&json!([{"title": "LWE", "pdf_url": pdf_url}]).to_string()))
    .expect(1)
    .mount(&chat_server)
    .await;

  // Ranking
  Mock::given(method("POST"))
    .and(body_string_contains("Group the following papers"))
    .respond_with(chat_reply(
      &json!({"groups": [{"name": "hardness", "papers": [{"title": "LWE", "pdf_url": pdf_url}]}]})
        .to_string(),
    ))
    .expect(1)
    .mount(&chat_server)
    .await;

  // Writing
  Mock::given(method("POST"))
    .and(body_string_contains("Write a full LaTeX manuscript"))
    .and(body_string_contains("Lattices are hard ."))
    .respond_with(chat_reply("\\documentclass{article}"))
    .expect(1)
    .mount(&chat_server)
    .await;

  Mock::given(method("GET"))
    .and(path("/pdf/lwe.pdf"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
    .mount(&files_server)
    .await;
  Mock::given(method("GET"))
    .and(path("/results/t9.zip"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(result_archive()))
    .mount(&files_server)
    .await;

  Mock::given(method("POST"))
    .and(path("/extract/task"))
    .and(body_string_contains(&pdf_url))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"task_id": "t9"}})),
    )
    .expect(1)
    .mount(&extraction_server)
    .await;
  Mock::given(method("GET"))
    .and(path("/extract/task/t9"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "code": 0,
      "data": {
        "task_id": "t9",
        "state": "done",
        "full_zip_url": format!("{}/results/t9.zip", files_server.uri())
      }
    })))
    .mount(&extraction_server)
    .await;

  let config = Config::default()
    .with_chat_url(&chat_server.uri())
    .with_chat_key("sk")
    .with_extraction_url(&extraction_server.uri())
    .with_extraction_key("mk")
    .with_poll_interval(0);
  let chat = ChatClient::new(&config)?;
  let extractor = Extractor::new(&config)?;
  let http = HttpClient::new(Duration::from_secs(5))?;
  let workspace = tempdir()?;

  let papers = discovery::search_papers(&chat, "lattices", 1).await?;
  let groups = discovery::group_and_rank(&chat, "lattices", &papers).await?;
  assert_eq!(groups.len(), 1);

  let mut notes = Vec::new();
  for group in &groups {
    for paper in &group.papers {
      let Some(url) = paper.pdf_url.as_deref() else { continue };
      let pdf_dir = workspace.path().join("papers").join(&group.name);
      let pdf = paper.download_pdf(&http, &pdf_dir).await?;
      assert!(pdf.ends_with("hardness/lwe.pdf"));

      let converted = workspace.path().join("converted").join(&group.name).join("lwe");
      let dir = extractor.convert(url, &converted, &CancellationToken::new()).await?;
      notes.extend(collect_notes(&dir)?);
    }
  }
  assert_eq!(notes, vec!["Lattices are hard .".to_string()]);

  let output = workspace.path().join("manuscript.tex");
  write_manuscript(&chat, "lattices", &notes, &output).await?;
  assert_eq!(std::fs::read_to_string(&output)?, "\\documentclass{article}");
  Ok(())
}

#[tokio::test]
async fn test_malformed_discovery_aborts() -> TestResult<()> {
  let chat_server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(chat_reply("I could not find any papers, sorry."))
    .mount(&chat_server)
    .await;

  let config = Config::default().with_chat_url(&chat_server.uri()).with_chat_key("sk");
  let chat = ChatClient::new(&config)?;

  let result = discovery::search_papers(&chat, "lattices", 3).await;
  assert!(matches!(result, Err(PapermillError::ResponseFormat(_))));
  Ok(())
}

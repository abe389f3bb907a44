//! Download and unpack extraction result archives.
//!
//! The archive is streamed to `result.zip` inside the destination directory chunk by chunk, so
//! the body is never held in memory, then every member is unpacked next to it. Rerunning against
//! the same directory overwrites files in place.

use std::{fs::File, io};

use tokio::io::AsyncWriteExt;
use zip::ZipArchive;

use super::*;

/// File name the downloaded archive is stored under.
pub const ARCHIVE_NAME: &str = "result.zip";

/// Downloads the archive at `archive_url` and unpacks it into `destination`.
///
/// The directory is created if absent. Returns `destination`.
///
/// # Errors
///
/// - [`PapermillError::Request`] or [`PapermillError::Network`] if the download fails
/// - [`PapermillError::Archive`] if the body is not a ZIP container or a member would land
///   outside `destination`
pub async fn materialize(
  http: &HttpClient,
  archive_url: &str,
  destination: &Path,
) -> Result<PathBuf> {
  let url = Url::parse(archive_url)?;
  tokio::fs::create_dir_all(destination).await?;

  let archive_path = destination.join(ARCHIVE_NAME);
  let bytes = download(http, url, &archive_path).await?;
  debug!("Downloaded {bytes} bytes to {archive_path:?}");

  let target = destination.to_path_buf();
  let files = tokio::task::spawn_blocking(move || unpack(&archive_path, &target))
    .await
    .map_err(|e| PapermillError::Archive(format!("unpacking was interrupted: {e}")))??;
  info!("Unpacked {} files into {destination:?}", files.len());

  Ok(destination.to_path_buf())
}

/// Streams the response body into `path`, returning the number of bytes written.
async fn download(http: &HttpClient, url: Url, path: &Path) -> Result<u64> {
  let mut response = http.send(http.get(url)).await?;
  let mut file = tokio::fs::File::create(path).await?;

  let mut written = 0u64;
  while let Some(chunk) = response.chunk().await? {
    file.write_all(&chunk).await?;
    written += chunk.len() as u64;
  }
  file.flush().await?;
  Ok(written)
}

/// Unpacks every member of the archive at `archive_path` into `destination`.
///
/// Returns the paths of the files written.
pub fn unpack(archive_path: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
  let file = File::open(archive_path)?;
  let mut archive = ZipArchive::new(file).map_err(archive_error)?;

  let mut written = Vec::with_capacity(archive.len());
  for index in 0..archive.len() {
    let mut entry = archive.by_index(index).map_err(archive_error)?;
    let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
      return Err(PapermillError::Archive(format!(
        "member {:?} would be written outside the destination",
        entry.name()
      )));
    };

    let path = destination.join(relative);
    if entry.is_dir() {
      std::fs::create_dir_all(&path)?;
      continue;
    }
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    trace!("Unpacking {:?} to {path:?}", entry.name());
    let mut out = File::create(&path)?;
    io::copy(&mut entry, &mut out)
      .map_err(|e| PapermillError::Archive(format!("member {:?} is corrupt: {e}", entry.name())))?;
    written.push(path);
  }
  Ok(written)
}

/// Maps a ZIP decoding failure to [`PapermillError::Archive`].
fn archive_error(error: zip::result::ZipError) -> PapermillError {
  PapermillError::Archive(error.to_string())
}

#[cfg(test)]
mod tests {
  use std::{
    collections::BTreeSet,
    io::{Cursor, Write},
  };

  use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
  };
  use zip::{write::FileOptions, ZipWriter};

  use super::*;

  fn build_zip(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in members {
      writer.start_file(*name, FileOptions::default()).unwrap();
      writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
  }

  async fn serve(body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/r.zip"))
      .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
      .mount(&server)
      .await;
    server
  }

  fn file_set(dir: &Path) -> BTreeSet<PathBuf> {
    glob::glob(&format!("{}/**/*", dir.display()))
      .unwrap()
      .filter_map(|entry| entry.ok())
      .filter(|path| path.is_file())
      .map(|path| path.strip_prefix(dir).unwrap().to_path_buf())
      .collect()
  }

  #[traced_test]
  #[tokio::test]
  async fn test_materialize_creates_directory_and_unpacks() {
    let server =
      serve(build_zip(&[("full.md", "# Title"), ("latex/main.tex", "\\section{Intro}")])).await;
    let dir = tempdir().unwrap();
    let destination = dir.path().join("nested").join("out");

    let http = HttpClient::new(Duration::from_secs(5)).unwrap();
    let result =
      materialize(&http, &format!("{}/r.zip", server.uri()), &destination).await.unwrap();

    assert_eq!(result, destination);
    assert_eq!(std::fs::read_to_string(destination.join("full.md")).unwrap(), "# Title");
    assert_eq!(
      std::fs::read_to_string(destination.join("latex/main.tex")).unwrap(),
      "\\section{Intro}"
    );
    assert!(destination.join(ARCHIVE_NAME).exists());
  }

  #[tokio::test]
  async fn test_materialize_is_idempotent() {
    let server = serve(build_zip(&[("a.tex", "one"), ("images/b.txt", "two")])).await;
    let dir = tempdir().unwrap();
    let http = HttpClient::new(Duration::from_secs(5)).unwrap();
    let url = format!("{}/r.zip", server.uri());

    materialize(&http, &url, dir.path()).await.unwrap();
    let first = file_set(dir.path());
    materialize(&http, &url, dir.path()).await.unwrap();
    let second = file_set(dir.path());

    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(dir.path().join("a.tex")).unwrap(), "one");
  }

  #[tokio::test]
  async fn test_malformed_archive() {
    let server = serve(b"definitely not a zip".to_vec()).await;
    let dir = tempdir().unwrap();
    let http = HttpClient::new(Duration::from_secs(5)).unwrap();

    assert!(matches!(
      materialize(&http, &format!("{}/r.zip", server.uri()), dir.path()).await,
      Err(PapermillError::Archive(_))
    ));
  }

  #[tokio::test]
  async fn test_download_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;
    let dir = tempdir().unwrap();
    let http = HttpClient::new(Duration::from_secs(5)).unwrap();

    assert!(matches!(
      materialize(&http, &format!("{}/r.zip", server.uri()), dir.path()).await,
      Err(PapermillError::Request { status: 404, .. })
    ));
  }

  #[test]
  fn test_member_escaping_destination() {
    let dir = tempdir().unwrap();
    let archive_path = dir.path().join(ARCHIVE_NAME);
    std::fs::write(&archive_path, build_zip(&[("../evil.txt", "gotcha")])).unwrap();
    let destination = dir.path().join("out");

    assert!(matches!(unpack(&archive_path, &destination), Err(PapermillError::Archive(_))));
    assert!(!dir.path().join("evil.txt").exists());
  }
}

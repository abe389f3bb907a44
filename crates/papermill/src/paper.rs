//! Paper and group types, and PDF download.
//!
//! Papers are produced by [`discovery`](crate::discovery) and never modified afterwards. The
//! model answering a discovery prompt may omit a paper's PDF link, so [`Paper::pdf_url`] is
//! optional and download loops skip papers without one.
//!
//! ```no_run
//! # use papermill::{config::Config, http::HttpClient, paper::Paper};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let paper = Paper::new("Attention Is All You Need", "https://arxiv.org/pdf/1706.03762");
//! let http = HttpClient::new(std::time::Duration::from_secs(10))?;
//! let path = paper.download_pdf(&http, "papers".as_ref()).await?;
//! println!("Saved to {}", path.display());
//! # Ok(())
//! # }
//! ```

use super::*;

/// File name used when a URL has no usable last path segment.
pub const FALLBACK_FILENAME: &str = "download.pdf";

/// A candidate paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
  /// The paper's title
  pub title:   String,
  /// Direct link to the PDF, when the model supplied one
  #[serde(default)]
  pub pdf_url: Option<String>,
}

impl Paper {
  /// Creates a paper with a PDF link.
  pub fn new(title: &str, pdf_url: &str) -> Self {
    Self { title: title.to_string(), pdf_url: Some(pdf_url.to_string()) }
  }

  /// File name the PDF is stored under, or `None` without a link.
  pub fn filename(&self) -> Option<String> { self.pdf_url.as_deref().map(filename_from_url) }

  /// Downloads the PDF into `dir`, creating it if needed, and returns the written path.
  ///
  /// An existing file of the same name is overwritten.
  ///
  /// # Errors
  ///
  /// - [`PapermillError::Config`] if the paper has no PDF link
  /// - [`PapermillError::Request`] on a non-2xx response
  /// - [`PapermillError::Network`] or [`PapermillError::Io`] if fetching or writing fails
  pub async fn download_pdf(&self, http: &HttpClient, dir: &Path) -> Result<PathBuf> {
    let Some(pdf_url) = &self.pdf_url else {
      return Err(PapermillError::Config(format!("No PDF URL available for \"{}\"", self.title)));
    };

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename_from_url(pdf_url));

    let response = http.send(http.get(Url::parse(pdf_url)?)).await?;
    let bytes = response.bytes().await?;
    debug!("Writing {} bytes of PDF to path: {path:?}", bytes.len());
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
  }
}

impl Display for Paper {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.pdf_url {
      Some(url) => write!(f, "{} ({url})", self.title),
      None => write!(f, "{}", self.title),
    }
  }
}

/// A named, ranked group of papers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  /// Group label chosen by the model
  #[serde(default = "default_group_name")]
  pub name:   String,
  /// Papers in rank order, most relevant first
  #[serde(default)]
  pub papers: Vec<Paper>,
}

impl Group {
  /// The group name made safe to use as a single directory name.
  ///
  /// Characters other than ASCII alphanumerics, `-`, `_`, `.` and spaces become `_`, and leading
  /// dots are dropped so the name can never walk up the tree.
  pub fn dirname(&self) -> String {
    let cleaned: String = self
      .name
      .trim()
      .chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
          c
        } else {
          '_'
        }
      })
      .collect();
    match cleaned.trim_start_matches('.').trim() {
      "" => default_group_name(),
      name => name.to_string(),
    }
  }
}

/// Name given to a group the model left unnamed.
fn default_group_name() -> String { "group".to_string() }

/// Percent-decoded last path segment of `url`.
///
/// Falls back to [`FALLBACK_FILENAME`] when the URL does not parse, ends in a slash, has no path,
/// or its last segment is `.`, `..` or decodes to something containing a path separator.
pub fn filename_from_url(url: &str) -> String {
  let segment = Url::parse(url)
    .ok()
    .and_then(|url| url.path_segments().and_then(|mut s| s.next_back()).map(str::to_string));
  let name = segment.and_then(|s| urlencoding::decode(&s).ok().map(|name| name.into_owned()));
  match name {
    Some(name) if !matches!(name.as_str(), "" | "." | "..") && !name.contains(['/', '\\']) =>
      name,
    _ => FALLBACK_FILENAME.to_string(),
  }
}

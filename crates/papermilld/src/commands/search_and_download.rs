//! Module for the `search-and-download` binary.

use super::*;

/// Ask the chat model for papers about a topic and download their PDFs
#[derive(Parser, Clone, Debug)]
#[command(name = "search-and-download", version)]
pub struct SearchAndDownloadArgs {
  /// Topic to research
  pub topic: String,

  /// Number of papers to request
  #[arg(short = 'n', long = "num", default_value_t = 5)]
  pub num: usize,

  /// Directory the PDFs are saved to
  #[arg(short, long, default_value = "papers")]
  pub output: PathBuf,

  #[command(flatten)]
  #[allow(missing_docs)]
  pub global: GlobalArgs,
}

/// Runs the search, then downloads every paper that has a PDF link.
///
/// A failed download is reported and the loop moves on. Returns the paths that were written.
pub async fn search_and_download<I: UserInteraction>(
  interaction: &I,
  args: SearchAndDownloadArgs,
) -> Result<Vec<PathBuf>> {
  let SearchAndDownloadArgs { topic, num, output, global } = args;
  let config = global.load_config()?;
  let chat = ChatClient::new(&config)?;
  let http = HttpClient::new(Duration::from_secs(config.download.timeout_secs))?;

  interaction.reply(ResponseContent::Working(&format!("Searching for papers about '{topic}'")))?;
  let papers = discovery::search_papers(&chat, &topic, num).await?;
  interaction.reply(ResponseContent::Papers(&papers))?;

  let mut saved = Vec::with_capacity(papers.len());
  for paper in &papers {
    if paper.pdf_url.is_none() {
      interaction
        .reply(ResponseContent::Warning(&format!("Skipping \"{}\": no PDF URL", paper.title)))?;
      continue;
    }
    match paper.download_pdf(&http, &output).await {
      Ok(path) => {
        interaction.reply(ResponseContent::Success(&format!("Saved {}", path.display())))?;
        saved.push(path);
      },
      Err(e) => interaction
        .reply(ResponseContent::Error(&format!("Failed to download \"{}\": {e}", paper.title)))?,
    }
  }

  interaction.reply(ResponseContent::Info(&format!(
    "Downloaded {} of {} papers into {}",
    saved.len(),
    papers.len(),
    output.display()
  )))?;
  Ok(saved)
}

//! Module for the `write-manuscript` binary.

use papermill::manuscript;

use super::*;

/// Generate a LaTeX manuscript from searched papers
#[derive(Parser, Clone, Debug)]
#[command(name = "write-manuscript", version)]
pub struct WriteManuscriptArgs {
  /// Topic to research
  pub topic: String,

  /// Number of papers to request
  #[arg(short = 'n', long = "num", default_value_t = 5)]
  pub num: usize,

  /// Directory for downloaded papers, one subdirectory per group
  #[arg(short, long, default_value = "papers")]
  pub output: PathBuf,

  /// Output LaTeX file
  #[arg(long, default_value = "manuscript.tex")]
  pub manuscript: PathBuf,

  /// Directory conversion results are unpacked into, one subdirectory per group and paper
  #[arg(long, default_value = "converted")]
  pub converted: PathBuf,

  #[command(flatten)]
  #[allow(missing_docs)]
  pub poll: PollArgs,

  #[command(flatten)]
  #[allow(missing_docs)]
  pub global: GlobalArgs,
}

/// Runs the whole pipeline and returns the manuscript path.
///
/// Unlike `search-and-download`, any download or conversion failure ends the run. Papers without
/// a PDF link are skipped.
pub async fn write_manuscript<I: UserInteraction>(
  interaction: &I,
  args: WriteManuscriptArgs,
  cancel: &CancellationToken,
) -> Result<PathBuf> {
  let WriteManuscriptArgs { topic, num, output, manuscript: target, converted, poll, global } =
    args;
  let config = poll.apply(global.load_config()?);
  let chat = ChatClient::new(&config)?;
  let extractor = Extractor::new(&config)?;
  let http = HttpClient::new(Duration::from_secs(config.download.timeout_secs))?;

  if target.exists()
    && !interaction.confirm(&format!("{} already exists. Overwrite?", target.display()))?
  {
    interaction.reply(ResponseContent::Info("Keeping the existing manuscript"))?;
    return Ok(target);
  }

  interaction.reply(ResponseContent::Working(&format!("Searching for papers about '{topic}'")))?;
  let papers = discovery::search_papers(&chat, &topic, num).await?;
  interaction.reply(ResponseContent::Papers(&papers))?;

  interaction.reply(ResponseContent::Working("Grouping and ranking papers"))?;
  let groups = discovery::group_and_rank(&chat, &topic, &papers).await?;

  let mut notes = Vec::new();
  for group in &groups {
    interaction.reply(ResponseContent::Group(group))?;
    let dirname = group.dirname();
    let pdf_dir = output.join(&dirname);

    for paper in &group.papers {
      let Some(pdf_url) = &paper.pdf_url else {
        interaction
          .reply(ResponseContent::Warning(&format!("Skipping \"{}\": no PDF URL", paper.title)))?;
        continue;
      };

      let pdf = paper.download_pdf(&http, &pdf_dir).await?;
      interaction.reply(ResponseContent::Success(&format!("Saved {}", pdf.display())))?;

      let stem =
        pdf.file_stem().map_or_else(|| "paper".to_string(), |s| s.to_string_lossy().into_owned());
      let latex_dir = converted.join(&dirname).join(stem);
      interaction.reply(ResponseContent::Working(&format!("Converting \"{}\"", paper.title)))?;
      let latex_dir = extractor.convert(pdf_url, &latex_dir, cancel).await?;
      let saved = format!("LaTeX files saved to: {}", latex_dir.display());
      interaction.reply(ResponseContent::Success(&saved))?;

      notes.extend(manuscript::collect_notes(&latex_dir)?);
    }
  }
  debug!("Collected {} notes for the manuscript", notes.len());

  interaction.reply(ResponseContent::Working("Writing manuscript"))?;
  let path = manuscript::write_manuscript(&chat, &topic, &notes, &target).await?;
  let written = format!("Manuscript written to {}", path.display());
  interaction.reply(ResponseContent::Success(&written))?;
  Ok(path)
}

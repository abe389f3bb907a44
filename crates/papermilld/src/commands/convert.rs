//! Module for the `convert-to-latex` binary.

use super::*;

/// Convert a PDF to LaTeX with the remote extraction service
#[derive(Parser, Clone, Debug)]
#[command(name = "convert-to-latex", version)]
pub struct ConvertArgs {
  /// Publicly reachable URL of the PDF
  pub pdf_url: String,

  /// Directory the conversion output is unpacked into
  #[arg(long, default_value = "output")]
  pub out: PathBuf,

  #[command(flatten)]
  #[allow(missing_docs)]
  pub poll: PollArgs,

  #[command(flatten)]
  #[allow(missing_docs)]
  pub global: GlobalArgs,
}

/// Submits the PDF, waits for the task and unpacks the result. Returns the output directory.
pub async fn convert<I: UserInteraction>(
  interaction: &I,
  args: ConvertArgs,
  cancel: &CancellationToken,
) -> Result<PathBuf> {
  let ConvertArgs { pdf_url, out, poll, global } = args;
  let config = poll.apply(global.load_config()?);
  let extractor = Extractor::new(&config)?;

  interaction.reply(ResponseContent::Working(&format!("Converting {pdf_url}")))?;
  let dir = extractor.convert(&pdf_url, &out, cancel).await?;
  interaction.reply(ResponseContent::Success(&format!("LaTeX files saved to: {}", dir.display())))?;
  Ok(dir)
}

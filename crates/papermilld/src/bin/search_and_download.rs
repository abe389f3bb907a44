//! `search-and-download`: find papers on a topic and fetch their PDFs.

use std::process::ExitCode;

use clap::Parser;
use papermilld::{commands::*, report, setup_logging, Terminal};

#[tokio::main]
async fn main() -> ExitCode {
  let args = SearchAndDownloadArgs::parse();
  setup_logging(args.global.verbose);

  let terminal = Terminal::new(args.global.accept_defaults);
  report(search_and_download(&terminal, args).await)
}

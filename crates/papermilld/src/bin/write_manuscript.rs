//! `write-manuscript`: search, rank, convert and draft a manuscript on a topic.

use std::process::ExitCode;

use clap::Parser;
use papermilld::{cancel_on_ctrl_c, commands::*, report, setup_logging, Terminal};

#[tokio::main]
async fn main() -> ExitCode {
  let args = WriteManuscriptArgs::parse();
  setup_logging(args.global.verbose);

  let terminal = Terminal::new(args.global.accept_defaults);
  let cancel = cancel_on_ctrl_c();
  report(write_manuscript(&terminal, args, &cancel).await)
}

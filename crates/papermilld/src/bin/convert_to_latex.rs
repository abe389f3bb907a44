//! `convert-to-latex`: convert one PDF through the extraction service.

use std::process::ExitCode;

use clap::Parser;
use papermilld::{cancel_on_ctrl_c, commands::*, report, setup_logging, Terminal};

#[tokio::main]
async fn main() -> ExitCode {
  let args = ConvertArgs::parse();
  setup_logging(args.global.verbose);

  let terminal = Terminal::new(args.global.accept_defaults);
  let cancel = cancel_on_ctrl_c();
  report(convert(&terminal, args, &cancel).await)
}

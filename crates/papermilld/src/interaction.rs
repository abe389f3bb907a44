//! Human-readable progress output and prompts.

use console::Emoji;
use dialoguer::Confirm;

use super::*;

/// Prefix for informational lines
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for work that is starting
pub static WORKING_PREFIX: &str = "» ";
/// Prefix for completed work
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for failures
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for recoverable problems
pub static WARNING_PREFIX: &str = "! ";
/// Tree branch for list items
pub static ITEM_PREFIX: &str = "├─";
/// Tree branch for the last list item
pub static LAST_ITEM_PREFIX: &str = "└─";
/// Heading decoration for paper lists, dropped on terminals without emoji support
pub static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");

/// Something to show the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// A list of papers
  Papers(&'a [Paper]),
  /// A ranked group of papers
  Group(&'a Group),
  /// Work that is about to start
  Working(&'a str),
  /// Work that completed
  Success(&'a str),
  /// A recoverable problem
  Warning(&'a str),
  /// A failure that did not abort the command
  Error(&'a str),
  /// Anything else
  Info(&'a str),
}

/// How commands talk to the user.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Shows progress or results.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Interaction on the attached terminal.
#[derive(Debug, Clone, Default)]
pub struct Terminal {
  /// Answer every prompt with "yes" instead of asking
  pub accept_defaults: bool,
}

impl Terminal {
  /// Creates a terminal interaction.
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults } }
}

impl UserInteraction for Terminal {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(Confirm::new().with_prompt(message).default(false).interact()?)
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Papers(papers) => {
        println!("{}Found {} papers:", style(BOOKS).cyan(), style(papers.len()).yellow());
        print_papers(papers);
      },
      ResponseContent::Group(group) => {
        println!(
          "{}{} {}",
          style(BOOKS).cyan(),
          style(&group.name).bold(),
          style(format!("({} papers)", group.papers.len())).dim()
        );
        print_papers(&group.papers);
      },
      ResponseContent::Working(message) => println!("{}{message}", style(WORKING_PREFIX).cyan()),
      ResponseContent::Success(message) => println!("{}{message}", style(SUCCESS_PREFIX).green()),
      ResponseContent::Warning(message) =>
        println!("{}{message}", style(WARNING_PREFIX).yellow()),
      ResponseContent::Error(message) =>
        println!("{}{}", style(ERROR_PREFIX).red(), style(message).red()),
      ResponseContent::Info(message) => println!("{}{message}", style(INFO_PREFIX).blue()),
    }
    Ok(())
  }
}

/// Prints papers as a tree, one per line.
fn print_papers(papers: &[Paper]) {
  for (i, paper) in papers.iter().enumerate() {
    let prefix = if i + 1 == papers.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
    match &paper.pdf_url {
      Some(url) => println!("  {} {} {}", style(prefix).dim(), paper.title, style(url).dim()),
      None => println!("  {} {} {}", style(prefix).dim(), paper.title, style("(no PDF)").yellow()),
    }
  }
}

//! Best-effort LaTeX denoising.
//!
//! This is a fixed set of pattern substitutions, not a LaTeX parser. It strips the markup that
//! dominates extracted papers so the remaining prose is cheaper to send to a model, and it is
//! lossy: nested braces, environments and math are left partially mangled. Keep it that way;
//! anything needing real structure should read the LaTeX properly instead.

use super::*;

lazy_static! {
  /// `\cite{...}`, removed with its argument.
  static ref CITE: Regex = Regex::new(r"\\cite\{[^}]*\}").unwrap();
  /// `\ref{...}`, removed with its argument.
  static ref REF: Regex = Regex::new(r"\\ref\{[^}]*\}").unwrap();
  /// Any command with a single brace argument, replaced by the argument.
  static ref COMMAND_WITH_ARG: Regex = Regex::new(r"\\[a-zA-Z]+\*?\{([^}]*)\}").unwrap();
  /// Any remaining bare command.
  static ref BARE_COMMAND: Regex = Regex::new(r"\\[a-zA-Z]+\*?").unwrap();
}

/// Strips common LaTeX markup, keeping the text it wraps.
///
/// ```
/// use papermill::markup::latex_to_markdown;
///
/// let text = r"\section{Results} We improve on prior work \cite{smith}, see \ref{fig:1}.";
/// assert_eq!(latex_to_markdown(text), "Results We improve on prior work , see .");
/// ```
pub fn latex_to_markdown(text: &str) -> String {
  let text = CITE.replace_all(text, "");
  let text = REF.replace_all(&text, "");
  let text = COMMAND_WITH_ARG.replace_all(&text, "$1");
  BARE_COMMAND.replace_all(&text, "").into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_strips_targeted_patterns() {
    let input = "\\section*{Intro}\n\\textbf{Bold} claim \\cite{a,b} in \\ref{sec:x}.\\newline End";
    assert_eq!(latex_to_markdown(input), "Intro\nBold claim  in . End");
  }

  #[test]
  fn test_plain_text_untouched() {
    let input = "No markup here, just {braces} and 100% prose.";
    assert_eq!(latex_to_markdown(input), input);
  }

  #[test]
  fn test_idempotent() {
    let inputs = [
      "\\begin{abstract}We study \\emph{lattices}.\\end{abstract}",
      "\\title{A \\textit{B}} \\maketitle",
      "plain words only",
    ];
    for input in inputs {
      let once = latex_to_markdown(input);
      assert_eq!(latex_to_markdown(&once), once, "not idempotent for {input:?}");
    }
  }
}

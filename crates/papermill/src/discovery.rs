//! Paper discovery and ranking through the chat model.
//!
//! The model is asked to answer in JSON, but its reply is free text. Every reply is treated as an
//! untyped external boundary: it is deserialized into the expected schema immediately and any
//! mismatch becomes [`PapermillError::ResponseFormat`]. Nothing is retried and no partial
//! structure is ever returned.

use super::*;
use crate::{
  chat::ChatClient,
  paper::{Group, Paper},
};

/// System prompt for [`search_papers`].
const SEARCH_SYSTEM_PROMPT: &str =
  "You are a helpful assistant that provides a list of academic papers with direct links to \
   their PDFs.";

/// System prompt for [`group_and_rank`].
const RANK_SYSTEM_PROMPT: &str =
  "You group academic papers about a topic and rank them by relevance.";

lazy_static! {
  /// A reply wrapped in a Markdown code fence, optionally tagged with a language.
  static ref CODE_FENCE: Regex = Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?```$").unwrap();
}

/// Expected shape of a ranking reply.
#[derive(Debug, Deserialize)]
struct Ranking {
  /// Groups in the order the model returned them
  groups: Vec<Group>,
}

/// Asks the model for `n` notable papers about `topic`.
///
/// # Errors
///
/// [`PapermillError::ResponseFormat`] if the reply is not a JSON list of objects with a `title`
/// (and optionally a `pdf_url`).
pub async fn search_papers(chat: &ChatClient, topic: &str, n: usize) -> Result<Vec<Paper>> {
  let prompt = format!(
    "Provide a JSON list of {n} notable academic papers about '{topic}'. Each list item should \
     have 'title' and 'pdf_url'."
  );
  let response =
    chat.request().with_system(SEARCH_SYSTEM_PROMPT).with_message(&prompt).send().await?;
  let papers: Vec<Paper> = parse_reply(response.content()?)?;
  info!("Model proposed {} papers about '{topic}'", papers.len());
  Ok(papers)
}

/// Asks the model to group `papers` and rank each group by relevance to `topic`.
///
/// # Errors
///
/// [`PapermillError::ResponseFormat`] if the reply is not an object with a `groups` list.
pub async fn group_and_rank(
  chat: &ChatClient,
  topic: &str,
  papers: &[Paper],
) -> Result<Vec<Group>> {
  let prompt = format!(
    "Group the following papers related to '{topic}' and rank them by relevance in JSON format \
     as {{\"groups\": [{{\"name\": str, \"papers\": [{{\"title\": str, \"pdf_url\": str}}]}}]}}:{}",
    serde_json::to_string(papers)?
  );
  let response =
    chat.request().with_system(RANK_SYSTEM_PROMPT).with_message(&prompt).send().await?;
  let ranking: Ranking = parse_reply(response.content()?)?;
  info!("Model arranged papers into {} groups", ranking.groups.len());
  Ok(ranking.groups)
}

/// Deserializes a model reply into `T`.
///
/// Surrounding whitespace and a single enclosing code fence are removed first; nothing else is
/// repaired.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
  let trimmed = reply.trim();
  let body = CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)).map_or(trimmed, |m| m.as_str());

  serde_json::from_str(body).map_err(|e| {
    debug!("Unparseable model reply: {reply}");
    PapermillError::ResponseFormat(e.to_string())
  })
}

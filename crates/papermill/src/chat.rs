//! Client for OpenAI compatible chat-completion services.
//!
//! Requests are assembled with a builder and carry one system message followed by one or more
//! user messages. The payload of a response is the content of its first choice; nothing about
//! its shape is guaranteed, so callers that expect structured output validate it themselves (see
//! [`discovery`](crate::discovery)).
//!
//! # Examples
//!
//! ```no_run
//! use papermill::{chat::ChatClient, config::Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?.with_credentials_file(".env")?;
//! let chat = ChatClient::new(&config)?;
//!
//! let reply = chat
//!   .request()
//!   .with_system("You are a helpful assistant.")
//!   .with_message("What is quantum computing?")
//!   .send()
//!   .await?;
//! println!("Response: {}", reply.content()?);
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::credentials::CHAT_KEY_VAR;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Instructions framing the conversation
  System,
  /// Input from the user
  User,
  /// Output from the model
  Assistant,
}

/// Message structure for chat interactions.
///
/// ```
/// use papermill::chat::{Message, Role};
///
/// let message = Message { role: Role::User, content: "What is the speed of light?".to_string() };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  /// The role of the message sender
  pub role:    Role,
  /// The message text
  pub content: String,
}

/// Client for the chat-completion service.
#[derive(Debug, Clone)]
pub struct ChatClient {
  /// Authenticated HTTP client
  http:     HttpClient,
  /// `{base}/chat/completions`
  endpoint: Url,
  /// Model used for requests built with [`ChatClient::request`]
  model:    String,
}

impl ChatClient {
  /// Builds a client from the configuration.
  ///
  /// # Errors
  ///
  /// Fails with [`PapermillError::CredentialMissing`] if no chat key is configured, before any
  /// network call is made.
  pub fn new(config: &Config) -> Result<Self> {
    let key = config
      .chat
      .api_key
      .as_deref()
      .ok_or_else(|| PapermillError::CredentialMissing(CHAT_KEY_VAR.to_string()))?;

    Ok(Self {
      http:     HttpClient::new(Duration::from_secs(config.chat.request_timeout_secs))?
        .with_bearer(key),
      endpoint: endpoint(&config.chat.base_url, "chat/completions")?,
      model:    config.chat.model.clone(),
    })
  }

  /// Starts a request for the configured model.
  pub fn request(&self) -> ChatRequest<'_> {
    ChatRequest { client: self, model: Some(self.model.clone()), messages: Vec::new() }
  }
}

/// Request builder for chat interactions.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
  /// Client the request is sent through
  #[serde(skip)]
  client:       &'a ChatClient,
  /// The model to use. Sending without one is an error.
  pub model:    Option<String>,
  /// Conversation messages, in order
  pub messages: Vec<Message>,
}

impl ChatRequest<'_> {
  /// Overrides the model for this request.
  pub fn with_model(mut self, model: &str) -> Self {
    self.model.replace(model.to_string());
    self
  }

  /// Adds a system message.
  pub fn with_system(mut self, content: &str) -> Self {
    self.messages.push(Message { role: Role::System, content: content.to_string() });
    self
  }

  /// Adds a user message.
  pub fn with_message(mut self, content: &str) -> Self {
    self.messages.push(Message { role: Role::User, content: content.to_string() });
    self
  }

  /// Sends the request.
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - No model is specified
  /// - No messages are provided
  /// - The service answers with a non-2xx status
  /// - The response cannot be decoded
  pub async fn send(&self) -> Result<ChatResponse> {
    if self.model.as_deref().map_or(true, str::is_empty) {
      return Err(PapermillError::ChatMissingModel);
    }
    if self.messages.is_empty() {
      return Err(PapermillError::ChatMissingMessage);
    }

    debug!("Sending {} messages to {}", self.messages.len(), self.client.endpoint);
    let http = &self.client.http;
    let request = http.post(self.client.endpoint.clone()).json(&self);
    http.send_json(request).await
  }
}

/// A single completion alternative.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
  /// Position of this choice
  #[serde(default)]
  pub index:         u32,
  /// Generated message
  pub message:       Message,
  /// Why generation stopped
  #[serde(default)]
  pub finish_reason: Option<String>,
}

/// Token accounting for a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
  /// Tokens in the prompt
  #[serde(default)]
  pub prompt_tokens:     u64,
  /// Tokens generated
  #[serde(default)]
  pub completion_tokens: u64,
  /// Sum of both
  #[serde(default)]
  pub total_tokens:      u64,
}

/// Response structure from chat-completion requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
  /// Name of the model that answered
  #[serde(default)]
  pub model:   String,
  /// Completion alternatives
  pub choices: Vec<Choice>,
  /// Token accounting, when reported
  #[serde(default)]
  pub usage:   Option<Usage>,
}

impl ChatResponse {
  /// Content of the first choice.
  ///
  /// # Errors
  ///
  /// [`PapermillError::ResponseFormat`] if the response has no choices.
  pub fn content(&self) -> Result<&str> {
    self
      .choices
      .first()
      .map(|choice| choice.message.content.as_str())
      .ok_or_else(|| PapermillError::ResponseFormat("response contained no choices".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
  };

  use super::*;

  fn client(uri: &str) -> ChatClient {
    ChatClient::new(&Config::default().with_chat_url(uri).with_chat_key("sk-test")).unwrap()
  }

  #[test]
  fn test_missing_key_fails_fast() {
    assert!(matches!(
      ChatClient::new(&Config::default()),
      Err(PapermillError::CredentialMissing(var)) if var == "OPENAI_API_KEY"
    ));
  }

  #[tokio::test]
  async fn test_missing_message() {
    let chat = client("http://localhost:1");
    assert!(matches!(chat.request().send().await, Err(PapermillError::ChatMissingMessage)));
  }

  #[tokio::test]
  async fn test_missing_model() {
    let chat = client("http://localhost:1");
    let request = chat.request().with_model("").with_message("hi");
    assert!(matches!(request.send().await, Err(PapermillError::ChatMissingModel)));
  }

  #[tokio::test]
  async fn test_send_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(header("authorization", "Bearer sk-test"))
      .and(body_json(json!({
        "model": "gpt-3.5-turbo",
        "messages": [
          {"role": "system", "content": "Be brief."},
          {"role": "user", "content": "Capital of France?"}
        ]
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "model": "gpt-3.5-turbo",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Paris"}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 1, "total_tokens": 13}
      })))
      .expect(1)
      .mount(&server)
      .await;

    let chat = client(&server.uri());
    let response =
      chat.request().with_system("Be brief.").with_message("Capital of France?").send().await;
    assert_eq!(response.unwrap().content().unwrap(), "Paris");
  }

  #[tokio::test]
  async fn test_no_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
      .mount(&server)
      .await;

    let response = client(&server.uri()).request().with_message("hi").send().await.unwrap();
    assert!(matches!(response.content(), Err(PapermillError::ResponseFormat(_))));
  }

  #[tokio::test]
  async fn test_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(429)).mount(&server).await;

    let result = client(&server.uri()).request().with_message("hi").send().await;
    assert!(matches!(result, Err(PapermillError::Request { status: 429, .. })));
  }
}

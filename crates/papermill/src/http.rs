//! Thin wrapper over [`reqwest`] shared by every service client.
//!
//! The wrapper does three things and nothing more: attach a bearer token when one is configured,
//! turn non-2xx statuses into [`PapermillError::Request`], and unwrap the `{code, msg, data}`
//! envelope used by the extraction service.

use reqwest::{RequestBuilder, Response};

use super::*;

/// HTTP client with optional bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpClient {
  /// Underlying connection pool
  client: reqwest::Client,
  /// Token attached to every request built through [`HttpClient::get`] and
  /// [`HttpClient::post`]
  bearer: Option<String>,
}

impl HttpClient {
  /// Creates a client whose requests time out after `timeout`.
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, bearer: None })
  }

  /// Attaches `token` as a bearer token to subsequent requests.
  pub fn with_bearer(mut self, token: &str) -> Self {
    self.bearer = Some(token.to_string());
    self
  }

  /// Starts a GET request.
  pub fn get(&self, url: Url) -> RequestBuilder { self.authorize(self.client.get(url)) }

  /// Starts a POST request.
  pub fn post(&self, url: Url) -> RequestBuilder { self.authorize(self.client.post(url)) }

  /// Sends a request, failing on any non-2xx status.
  pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    check_status(response)
  }

  /// Sends a request and decodes the JSON body of a successful response.
  pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
    let response = self.send(request).await?;
    Ok(response.json().await?)
  }

  /// Sends a request and unwraps the `{code, msg, data}` envelope of a successful response.
  ///
  /// A body that is not an envelope is a [`PapermillError::Protocol`] failure, not a network
  /// one.
  pub async fn send_envelope<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
    let body = self.send(request).await?.text().await?;
    let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
      trace!("Undecodable envelope: {body}");
      PapermillError::Protocol { code: MISSING_CODE, message: format!("malformed response: {e}") }
    })?;
    envelope.into_data()
  }

  /// Adds the bearer header when a token is set.
  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.bearer {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }
}

/// Maps a non-2xx response to [`PapermillError::Request`].
pub fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    Ok(response)
  } else {
    trace!("Unsuccessful response: {response:?}");
    Err(PapermillError::Request { status: status.as_u16(), url: response.url().to_string() })
  }
}

/// Appends `path` to `base` without discarding the last segment of `base`.
///
/// [`Url::join`] treats `https://host/api/v4` as a file and would replace `v4`; service base
/// URLs are configured without trailing slashes, so segments are appended textually instead.
pub fn endpoint(base: &str, path: &str) -> Result<Url> {
  Ok(Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')))?)
}

/// Code reported in [`PapermillError::Protocol`] when a response carries no status code.
pub const MISSING_CODE: i64 = -1;

/// Response envelope used by the extraction service.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  /// Zero on success
  pub code: Option<i64>,
  /// Human readable status message
  #[serde(default)]
  pub msg:  String,
  /// Payload, present on success
  pub data: Option<T>,
}

impl<T> Envelope<T> {
  /// Returns the payload, or [`PapermillError::Protocol`] if the service reported a failure.
  pub fn into_data(self) -> Result<T> {
    match self.code {
      Some(0) => self.data.ok_or_else(|| PapermillError::Protocol {
        code:    0,
        message: "response carried no data".to_string(),
      }),
      Some(code) => Err(PapermillError::Protocol { code, message: self.msg }),
      None => Err(PapermillError::Protocol {
        code:    MISSING_CODE,
        message: "response carried no status code".to_string(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_keeps_version_segment() {
    let url = endpoint("https://mineru.net/api/v4", "/extract/task").unwrap();
    assert_eq!(url.as_str(), "https://mineru.net/api/v4/extract/task");

    let url = endpoint("https://api.openai.com/v1/", "chat/completions").unwrap();
    assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");
  }

  #[test]
  fn test_envelope_nonzero_code() {
    let envelope: Envelope<serde_json::Value> =
      serde_json::from_str(r#"{"code": -60002, "msg": "bad url", "data": null}"#).unwrap();
    match envelope.into_data() {
      Err(PapermillError::Protocol { code, message }) => {
        assert_eq!(code, -60002);
        assert_eq!(message, "bad url");
      },
      other => panic!("expected Protocol error, got {other:?}"),
    }
  }

  #[test]
  fn test_envelope_missing_code() {
    let envelope: Envelope<serde_json::Value> =
      serde_json::from_str(r#"{"data": {"task_id": "t1"}}"#).unwrap();
    assert!(matches!(
      envelope.into_data(),
      Err(PapermillError::Protocol { code: MISSING_CODE, .. })
    ));
  }

  #[test]
  fn test_envelope_missing_data() {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(r#"{"code": 0}"#).unwrap();
    assert!(matches!(envelope.into_data(), Err(PapermillError::Protocol { code: 0, .. })));
  }
}

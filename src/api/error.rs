//! Normalized error type for every backend call.

use reqwest::StatusCode;
use serde::Deserialize;

/// What went wrong, beyond the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Connection refused, DNS failure, timeout, broken body stream
  Transport,
  /// The server answered with a non-2xx status
  Status,
  /// The body was not the JSON we expected
  Decode,
  /// The request was superseded or aborted on our side
  Cancelled,
}

/// Error shape surfaced to the UI: an optional HTTP status and a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
  pub status: Option<u16>,
  pub message: String,
  kind: ErrorKind,
}

impl RequestError {
  pub fn transport(message: impl Into<String>) -> Self {
    Self {
      status: None,
      message: message.into(),
      kind: ErrorKind::Transport,
    }
  }

  pub fn decode(message: impl Into<String>) -> Self {
    Self {
      status: None,
      message: message.into(),
      kind: ErrorKind::Decode,
    }
  }

  pub fn cancelled() -> Self {
    Self {
      status: None,
      message: "Request was cancelled".to_string(),
      kind: ErrorKind::Cancelled,
    }
  }

  /// Build an error from a non-2xx response body.
  ///
  /// The server's own `message` (or `error`) field wins; otherwise a short
  /// plain-text body is used, and finally the canonical status reason.
  pub fn from_response(status: StatusCode, body: &str) -> Self {
    let message = server_message(body).unwrap_or_else(|| {
      let text = body.trim();
      if !text.is_empty() && text.len() <= 200 && !text.starts_with('<') {
        text.to_string()
      } else {
        format!(
          "HTTP {} {}",
          status.as_u16(),
          status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string()
      }
    });

    Self {
      status: Some(status.as_u16()),
      message,
      kind: ErrorKind::Status,
    }
  }

  #[cfg(test)]
  pub fn kind(&self) -> ErrorKind {
    self.kind
  }

  pub fn is_cancelled(&self) -> bool {
    self.kind == ErrorKind::Cancelled
  }

  pub fn is_unauthorized(&self) -> bool {
    self.status == Some(401)
  }
}

impl From<reqwest::Error> for RequestError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      return Self::decode(format!("Invalid response body: {}", err));
    }
    match err.status() {
      Some(status) => Self {
        status: Some(status.as_u16()),
        message: err.to_string(),
        kind: ErrorKind::Status,
      },
      None => Self::transport(err.to_string()),
    }
  }
}

impl From<serde_json::Error> for RequestError {
  fn from(err: serde_json::Error) -> Self {
    Self::decode(format!("Invalid response body: {}", err))
  }
}

#[derive(Deserialize)]
struct ApiErrorBody {
  message: Option<String>,
  error: Option<String>,
}

fn server_message(body: &str) -> Option<String> {
  let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
  parsed
    .message
    .or(parsed.error)
    .filter(|m| !m.trim().is_empty())
}

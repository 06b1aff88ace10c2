//! Loopback HTTP responder for adapter and service tests.
//!
//! Serves one canned response per connection, in order, and records what
//! each request looked like.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::session::CredentialSource;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
  pub method: String,
  /// Path including the query string
  pub target: String,
  /// Header names are lowercased
  pub headers: HashMap<String, String>,
  pub body: String,
}

impl CapturedRequest {
  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(name).map(String::as_str)
  }

  pub fn json(&self) -> serde_json::Value {
    serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
  }
}

pub struct TestServer {
  pub url: String,
  requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl TestServer {
  pub async fn start(responses: Vec<(u16, &'static str)>) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    tokio::spawn(async move {
      for (status, body) in responses {
        let Ok((stream, _)) = listener.accept().await else {
          break;
        };
        handle(stream, status, body, &recorded).await;
      }
    });

    Self {
      url: format!("http://{}/api", addr),
      requests,
    }
  }

  /// Convenience for a single JSON response.
  pub async fn respond(status: u16, body: &'static str) -> Self {
    Self::start(vec![(status, body)]).await
  }

  pub fn requests(&self) -> Vec<CapturedRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn last_request(&self) -> CapturedRequest {
    self.requests().pop().expect("no request received")
  }
}

async fn handle(
  mut stream: TcpStream,
  status: u16,
  body: &str,
  recorded: &Arc<Mutex<Vec<CapturedRequest>>>,
) {
  let mut buf = Vec::new();
  let mut chunk = [0u8; 4096];

  let header_end = loop {
    let n = stream.read(&mut chunk).await.unwrap_or(0);
    if n == 0 {
      return;
    }
    buf.extend_from_slice(&chunk[..n]);
    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
      break pos + 4;
    }
  };

  let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
  let mut lines = head.split("\r\n");
  let request_line = lines.next().unwrap_or_default();
  let mut parts = request_line.split_whitespace();
  let method = parts.next().unwrap_or_default().to_string();
  let target = parts.next().unwrap_or_default().to_string();

  let headers: HashMap<String, String> = lines
    .filter_map(|line| line.split_once(':'))
    .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
    .collect();

  let content_length: usize = headers
    .get("content-length")
    .and_then(|v| v.parse().ok())
    .unwrap_or(0);
  while buf.len() < header_end + content_length {
    let n = stream.read(&mut chunk).await.unwrap_or(0);
    if n == 0 {
      break;
    }
    buf.extend_from_slice(&chunk[..n]);
  }
  let body_end = (header_end + content_length).min(buf.len());
  let request_body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

  recorded.lock().unwrap().push(CapturedRequest {
    method,
    target,
    headers,
    body: request_body,
  });

  let reason = reqwest::StatusCode::from_u16(status)
    .ok()
    .and_then(|s| s.canonical_reason())
    .unwrap_or("Unknown");
  let response = format!(
    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
    status,
    reason,
    body.len(),
    body
  );
  let _ = stream.write_all(response.as_bytes()).await;
  let _ = stream.shutdown().await;
}

/// Credential source with a fixed token.
pub struct StaticToken(pub Option<&'static str>);

impl CredentialSource for StaticToken {
  fn bearer_token(&self) -> Option<String> {
    self.0.map(String::from)
  }
}

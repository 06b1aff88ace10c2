use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::error::RequestError;
use crate::config::ApiConfig;
use crate::session::CredentialSource;

/// Shared HTTP client for all resource services.
///
/// Every request goes to the configured base endpoint and carries the
/// session's bearer token when one exists. Cloning is cheap.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  credentials: Arc<dyn CredentialSource>,
}

impl ApiClient {
  pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialSource>) -> Result<Self> {
    let mut builder =
      reqwest::Client::builder().user_agent(concat!("shopdesk/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let base_url = parse_base_url(config.base_url()?)?;

    Ok(Self {
      http,
      base_url,
      credentials,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
    self
      .send(Method::GET, path, None::<&()>, None::<&()>)
      .await
  }

  pub async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, RequestError>
  where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
  {
    self.send(Method::GET, path, Some(query), None::<&()>).await
  }

  pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.send(Method::POST, path, None::<&()>, Some(body)).await
  }

  pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.send(Method::PATCH, path, None::<&()>, Some(body)).await
  }

  pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
    self
      .send(Method::DELETE, path, None::<&()>, None::<&()>)
      .await
  }

  async fn send<T, Q, B>(
    &self,
    method: Method,
    path: &str,
    query: Option<&Q>,
    body: Option<&B>,
  ) -> Result<T, RequestError>
  where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
    B: Serialize + ?Sized,
  {
    let url = self.url(path)?;
    debug!(%method, %url, "Sending request");

    let mut request = self.authorize(self.http.request(method.clone(), url));
    if let Some(query) = query {
      request = request.query(query);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    let result = match request.send().await {
      Ok(response) => parse_response(response).await,
      Err(e) => Err(RequestError::from(e)),
    };

    if let Err(e) = &result {
      warn!(%method, path, status = ?e.status, "Request failed: {}", e);
    }
    result
  }

  /// Attach the bearer token, if the session has one right now.
  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match self.credentials.bearer_token() {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  fn url(&self, path: &str) -> Result<Url, RequestError> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| RequestError::transport(format!("Invalid request path {}: {}", path, e)))
  }
}

/// Parse the base endpoint, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut url =
    Url::parse(raw.trim()).map_err(|e| eyre!("Invalid API URL '{}': {}", raw, e))?;

  if url.scheme() != "http" && url.scheme() != "https" {
    return Err(eyre!("API URL must use http or https: {}", raw));
  }

  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
  let status = response.status();
  let bytes = response.bytes().await?;

  if !status.is_success() {
    let body = String::from_utf8_lossy(&bytes);
    return Err(RequestError::from_response(status, &body));
  }

  // 204 and friends: let `()` and `Option<T>` decode from null
  if bytes.iter().all(u8::is_ascii_whitespace) {
    return Ok(serde_json::from_str("null")?);
  }

  Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::error::ErrorKind;
  use crate::api::test_server::{StaticToken, TestServer};
  use serde::Deserialize;

  #[derive(Debug, Deserialize, PartialEq)]
  struct Ping {
    ok: bool,
  }

  fn client(url: &str, token: Option<&'static str>) -> ApiClient {
    let config = ApiConfig {
      url: Some(url.to_string()),
      timeout_secs: Some(5),
    };
    ApiClient::new(&config, Arc::new(StaticToken(token))).unwrap()
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let url = parse_base_url("https://shop.example.com/api").unwrap();
    assert_eq!(url.as_str(), "https://shop.example.com/api/");
    assert_eq!(
      url.join("payments").unwrap().as_str(),
      "https://shop.example.com/api/payments"
    );
  }

  #[test]
  fn test_base_url_rejects_other_schemes() {
    assert!(parse_base_url("ftp://shop.example.com").is_err());
    assert!(parse_base_url("not a url").is_err());
  }

  #[tokio::test]
  async fn test_bearer_token_attached() {
    let server = TestServer::respond(200, r#"{"ok":true}"#).await;
    let api = client(&server.url, Some("secret"));

    let ping: Ping = api.get("/ping").await.unwrap();
    assert_eq!(ping, Ping { ok: true });

    let req = server.last_request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.target, "/api/ping");
    assert_eq!(req.header("authorization"), Some("Bearer secret"));
  }

  #[tokio::test]
  async fn test_no_token_no_header() {
    let server = TestServer::respond(200, r#"{"ok":true}"#).await;
    let api = client(&server.url, None);

    let _: Ping = api.get("ping").await.unwrap();
    assert_eq!(server.last_request().header("authorization"), None);
  }

  #[tokio::test]
  async fn test_query_and_body_are_sent() {
    let server = TestServer::start(vec![(200, r#"{"ok":true}"#), (201, r#"{"ok":true}"#)]).await;
    let api = client(&server.url, None);

    let _: Ping = api.get_with("report", &[("date", "2024-06-01")]).await.unwrap();
    let _: Ping = api
      .post("report", &serde_json::json!({"amount": 12.5}))
      .await
      .unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].target, "/api/report?date=2024-06-01");
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].json()["amount"], 12.5);
    assert_eq!(
      requests[1].header("content-type"),
      Some("application/json")
    );
  }

  #[tokio::test]
  async fn test_server_message_surfaced() {
    let server = TestServer::respond(422, r#"{"message":"Amount must be positive"}"#).await;
    let api = client(&server.url, None);

    let err = api.get::<Ping>("ping").await.unwrap_err();
    assert_eq!(err.status, Some(422));
    assert_eq!(err.message, "Amount must be positive");
    assert_eq!(err.kind(), ErrorKind::Status);
  }

  #[tokio::test]
  async fn test_empty_body_decodes_unit() {
    let server = TestServer::respond(204, "").await;
    let api = client(&server.url, None);

    let result: Result<(), _> = api.delete("expenses/9").await;
    assert!(result.is_ok());
    assert_eq!(server.last_request().method, "DELETE");
  }

  #[tokio::test]
  async fn test_malformed_json_is_decode_error() {
    let server = TestServer::respond(200, r#"{"ok": tru"#).await;
    let api = client(&server.url, None);

    let err = api.get::<Ping>("ping").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.status, None);
  }

  #[tokio::test]
  async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(&format!("http://{}", addr), None);
    let err = api.get::<Ping>("ping").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status, None);
    assert!(!err.message.is_empty());
  }
}

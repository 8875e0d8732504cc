//! Authenticated HTTP access to the club backend.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::envelope::{ErrorEnvelope, SuccessEnvelope};
use super::error::ApiError;
use crate::config::ApiConfig;
use crate::store::Session;

/// Callback fired when the server rejects the stored credentials.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// Whether a request carries the stored bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
  Bearer,
  None,
}

/// Decoded `data` of a successful call, plus the optional server message.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
  pub data: T,
  pub message: Option<String>,
}

/// A single backend call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  method: Method,
  path: String,
  query: Vec<(String, String)>,
  body: Option<serde_json::Value>,
  auth: Auth,
}

impl ApiRequest {
  pub fn new(method: Method, path: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body: None,
      auth: Auth::Bearer,
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new(Method::GET, path)
  }

  pub fn post(path: impl Into<String>) -> Self {
    Self::new(Method::POST, path)
  }

  pub fn put(path: impl Into<String>) -> Self {
    Self::new(Method::PUT, path)
  }

  pub fn delete(path: impl Into<String>) -> Self {
    Self::new(Method::DELETE, path)
  }

  pub fn query<I, K, V>(mut self, params: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    self
      .query
      .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
    self
  }

  pub fn json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
    let value = serde_json::to_value(body)
      .map_err(|e| ApiError::Unexpected(format!("failed to encode request body: {}", e)))?;
    self.body = Some(value);
    Ok(self)
  }

  /// Mark the request as public (login, password reset, legal documents).
  pub fn public(mut self) -> Self {
    self.auth = Auth::None;
    self
  }
}

/// Backend gateway.
///
/// Cheap to clone; clones share the HTTP connection pool, the session and the
/// unauthorized handler.
#[derive(Clone)]
pub struct Gateway {
  http: reqwest::Client,
  base_url: Url,
  session: Session,
  on_unauthorized: Arc<RwLock<Option<UnauthorizedHandler>>>,
}

impl Gateway {
  pub fn new(config: &ApiConfig, session: Session) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| ApiError::Unexpected(format!("failed to build HTTP client: {}", e)))?;

    Ok(Self {
      http,
      base_url: parse_base_url(&config.base_url)?,
      session,
      on_unauthorized: Arc::new(RwLock::new(None)),
    })
  }

  /// Register the callback invoked after a 401 has cleared the credentials.
  ///
  /// Navigation back to a login screen belongs to whoever registers this.
  pub fn set_unauthorized_handler(&self, handler: UnauthorizedHandler) {
    if let Ok(mut slot) = self.on_unauthorized.write() {
      *slot = Some(handler);
    }
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Execute a request and decode its `data` into `T`.
  pub async fn send<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<ApiResponse<T>, ApiError> {
    let url = self.endpoint(&req.path)?;
    debug!(method = %req.method, %url, "api request");

    let mut builder = self.http.request(req.method.clone(), url);
    if !req.query.is_empty() {
      builder = builder.query(&req.query);
    }
    if let Some(body) = &req.body {
      builder = builder.json(body);
    }
    if req.auth == Auth::Bearer {
      // A broken local store should not block the request; the server decides.
      match self.session.token() {
        Ok(Some(token)) => builder = builder.bearer_auth(token),
        Ok(None) => {}
        Err(e) => warn!("could not read stored token: {}", e),
      }
    }

    let response = builder.send().await.map_err(|e| {
      warn!(path = %req.path, "request failed: {}", e);
      ApiError::from(e)
    })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(ApiError::from)?;

    self.decode(&req, status, &bytes)
  }

  /// Shorthand for `send` when the server message is not needed.
  pub async fn call<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, ApiError> {
    Ok(self.send(req).await?.data)
  }

  fn decode<T: DeserializeOwned>(
    &self,
    req: &ApiRequest,
    status: StatusCode,
    body: &[u8],
  ) -> Result<ApiResponse<T>, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
      warn!(path = %req.path, "server rejected credentials");
      // Public endpoints answer 401 for bad login data; that is not a session expiry.
      if req.auth == Auth::Bearer {
        self.handle_unauthorized();
        return Err(ApiError::Unauthorized);
      }
      let envelope = ErrorEnvelope::from_body(body);
      return Err(ApiError::from_envelope(status.as_u16(), envelope));
    }

    if !status.is_success() {
      let envelope = ErrorEnvelope::from_body(body);
      debug!(status = status.as_u16(), code = ?envelope.error_code, "api error");
      return Err(ApiError::from_envelope(status.as_u16(), envelope));
    }

    let raw: serde_json::Value = if body.is_empty() {
      serde_json::Value::Null
    } else {
      serde_json::from_slice(body)
        .map_err(|e| ApiError::Unexpected(format!("invalid JSON from {}: {}", req.path, e)))?
    };

    let envelope: SuccessEnvelope = match raw {
      serde_json::Value::Null => SuccessEnvelope {
        success: None,
        data: serde_json::Value::Null,
        message: None,
      },
      other => serde_json::from_value(other)
        .map_err(|e| ApiError::Unexpected(format!("invalid envelope from {}: {}", req.path, e)))?,
    };

    if envelope.is_failure() {
      let error = ErrorEnvelope::from_body(body);
      return Err(ApiError::from_envelope(status.as_u16(), error));
    }

    let data = serde_json::from_value(envelope.data)
      .map_err(|e| ApiError::Unexpected(format!("unexpected data from {}: {}", req.path, e)))?;

    Ok(ApiResponse {
      data,
      message: envelope.message,
    })
  }

  fn handle_unauthorized(&self) {
    if let Err(e) = self.session.clear() {
      warn!("failed to clear credentials after 401: {}", e);
    }
    let handler = self
      .on_unauthorized
      .read()
      .ok()
      .and_then(|slot| slot.clone());
    if let Some(handler) = handler {
      handler();
    }
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| ApiError::Unexpected(format!("invalid endpoint path {}: {}", path, e)))
  }
}

/// Parse the configured base URL so relative joins keep its path prefix.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
  let mut normalized = raw.trim().to_string();
  if !normalized.ends_with('/') {
    normalized.push('/');
  }
  Url::parse(&normalized)
    .map_err(|e| ApiError::Unexpected(format!("invalid API base URL '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::serve;
  use crate::store::{KvStore, MemoryKvStore};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio::net::TcpListener;

  fn gateway(base_url: &str) -> (Arc<MemoryKvStore>, Gateway) {
    let store = Arc::new(MemoryKvStore::new());
    let session = Session::new(store.clone());
    let config = ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: 5,
    };
    (store, Gateway::new(&config, session).unwrap())
  }

  #[test]
  fn test_endpoint_keeps_base_path() {
    let (_, gw) = gateway("https://club.example.com/api/v1");
    assert_eq!(
      gw.endpoint("/events").unwrap().as_str(),
      "https://club.example.com/api/v1/events"
    );
    assert_eq!(
      gw.endpoint("events/3/register").unwrap().as_str(),
      "https://club.example.com/api/v1/events/3/register"
    );
  }

  #[tokio::test]
  async fn test_success_attaches_bearer_token() {
    let (url, server) = serve(vec![(200, r#"{"success":true,"data":{"n":7},"message":"ok"}"#)]).await;
    let (store, gw) = gateway(&url);
    store.set("authToken", "secret-token").unwrap();

    #[derive(serde::Deserialize)]
    struct N {
      n: u32,
    }

    let resp: ApiResponse<N> = gw
      .send(ApiRequest::get("/me").query([("page", "2")]))
      .await
      .unwrap();
    assert_eq!(resp.data.n, 7);
    assert_eq!(resp.message.as_deref(), Some("ok"));

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /api/v1/me?page=2 "));
    assert!(requests[0]
      .to_lowercase()
      .contains("authorization: bearer secret-token"));
  }

  #[tokio::test]
  async fn test_public_request_has_no_token() {
    let (url, server) = serve(vec![(200, r#"{"success":true}"#)]).await;
    let (store, gw) = gateway(&url);
    store.set("authToken", "secret-token").unwrap();

    gw.call::<()>(ApiRequest::post("/auth/forgot-password").public())
      .await
      .unwrap();

    let requests = server.await.unwrap();
    assert!(!requests[0].to_lowercase().contains("authorization"));
  }

  #[tokio::test]
  async fn test_unauthorized_clears_session_and_fires_once() {
    let (url, server) = serve(vec![(401, r#"{"success":false,"message":"expired"}"#)]).await;
    let (store, gw) = gateway(&url);
    store.set("authToken", "stale").unwrap();
    store.set("refreshToken", "stale-refresh").unwrap();
    store.set("snapshot:event:9a3c", "{}").unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    gw.set_unauthorized_handler(Arc::new(move || {
      counter.fetch_add(1, Ordering::SeqCst);
    }));

    let err = gw.call::<()>(ApiRequest::get("/events")).await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("authToken").unwrap(), None);
    assert_eq!(store.get("refreshToken").unwrap(), None);
    assert_eq!(store.get("snapshot:event:9a3c").unwrap(), None);
    server.await.unwrap();
  }

  #[tokio::test]
  async fn test_business_error_keeps_server_message() {
    let (url, server) = serve(vec![(
      409,
      r#"{"success":false,"errorCode":"EVENT_FULL","message":"Evento completo","action":"NONE"}"#,
    )])
    .await;
    let (_, gw) = gateway(&url);

    let err = gw
      .call::<()>(ApiRequest::post("/events/1/register"))
      .await
      .unwrap_err();
    match err {
      ApiError::Business {
        status,
        code,
        message,
        ..
      } => {
        assert_eq!(status, 409);
        assert_eq!(code.as_deref(), Some("EVENT_FULL"));
        assert_eq!(message, "Evento completo");
      }
      other => panic!("expected business error, got {:?}", other),
    }
    server.await.unwrap();
  }

  #[tokio::test]
  async fn test_null_action_does_not_hide_server_message() {
    let (url, server) = serve(vec![(
      409,
      r#"{"success":false,"errorCode":"EVENT_FULL","message":"Evento completo","action":null}"#,
    )])
    .await;
    let (_, gw) = gateway(&url);

    let err = gw
      .call::<()>(ApiRequest::post("/events/1/register"))
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "Evento completo");
    assert_eq!(err.action(), crate::api::RecoveryAction::None);
    server.await.unwrap();
  }

  #[tokio::test]
  async fn test_non_json_error_uses_fallback() {
    let (url, server) = serve(vec![(500, "<html>oops</html>")]).await;
    let (_, gw) = gateway(&url);

    let err = gw.call::<()>(ApiRequest::get("/events")).await.unwrap_err();
    assert_eq!(err.to_string(), crate::api::fallback_message(500));
    server.await.unwrap();
  }

  #[tokio::test]
  async fn test_success_false_on_200_is_business_error() {
    let (url, server) = serve(vec![(200, r#"{"success":false,"message":"Sin cupos"}"#)]).await;
    let (_, gw) = gateway(&url);

    let err = gw.call::<()>(ApiRequest::get("/events")).await.unwrap_err();
    assert_eq!(err.to_string(), "Sin cupos");
    server.await.unwrap();
  }

  #[tokio::test]
  async fn test_unreachable_server_is_offline() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (_, gw) = gateway(&format!("http://{}", addr));
    let err = gw.call::<()>(ApiRequest::get("/events")).await.unwrap_err();
    assert!(err.is_offline(), "got {:?}", err);
  }
}
